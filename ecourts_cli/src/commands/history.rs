use anyhow::Result;
use clap::Args;
use ecourts_lib::ResultSink;

use crate::output::{print_history_table, print_json, OutputFormat};

#[derive(Args)]
pub struct HistoryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "20")]
    pub limit: u32,
}

pub fn run(args: &HistoryArgs, db_path: &str, format: &OutputFormat) -> Result<()> {
    let sink = ResultSink::open(db_path)?;
    let history = sink.history(args.limit)?;

    match format {
        OutputFormat::Table => print_history_table(&history),
        OutputFormat::Json => print_json(&history),
    }
    Ok(())
}
