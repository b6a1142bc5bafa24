//! Output formatting utilities for the CLI

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};

use ota_extract::PartitionSummary;

/// Render the partition listing as a table.
pub fn partition_table(summaries: &[PartitionSummary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Partition", "Size"]);

    for summary in summaries {
        let size = summary.size.map_or_else(|| "???".to_string(), format_size);
        table.add_row(vec![Cell::new(&summary.name), Cell::new(size)]);
    }

    table
}

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_sizes_per_unit() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(4096), "4.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MiB");
        assert_eq!(format_size(5_368_709_120), "5.0 GiB");
    }

    #[test]
    fn table_lists_every_partition() {
        let summaries = vec![
            PartitionSummary {
                name: "boot".to_string(),
                size: Some(4096),
            },
            PartitionSummary {
                name: "vendor".to_string(),
                size: None,
            },
        ];

        let rendered = partition_table(&summaries).to_string();
        assert!(rendered.contains("boot"));
        assert!(rendered.contains("4.0 KiB"));
        assert!(rendered.contains("vendor"));
        assert!(rendered.contains("???"));
    }
}
