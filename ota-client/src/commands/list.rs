//! Handle the `list` subcommand

use anyhow::Result;

use crate::ListArgs;
use crate::archive::PayloadFile;
use crate::output;

pub async fn handle(args: ListArgs) -> Result<()> {
    let payload = PayloadFile::open(&args.payload)?;
    let summaries = ota_extract::list_partitions(payload.path())?;
    println!("{}", output::partition_table(&summaries));
    Ok(())
}
