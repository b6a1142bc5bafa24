//! Handle the `extract` subcommand

use anyhow::{Context, Result};
use tracing::info;

use ota_extract::ExtractOptions;

use crate::ExtractArgs;
use crate::archive::PayloadFile;

pub async fn handle(args: ExtractArgs) -> Result<()> {
    let payload = PayloadFile::open(&args.payload)?;

    let mut options = ExtractOptions::default();
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency.max(1);
    }

    match &args.baseline {
        Some(baseline_path) => {
            let baseline = PayloadFile::open(baseline_path)?;
            ota_extract::extract_incremental(
                payload.path(),
                baseline.path(),
                &args.output,
                &options,
            )
            .await
        }
        None => ota_extract::extract_full(payload.path(), &args.output, &options).await,
    }
    .with_context(|| format!("failed to extract {}", args.payload.display()))?;

    info!(output = %args.output.display(), "extraction complete");
    Ok(())
}
