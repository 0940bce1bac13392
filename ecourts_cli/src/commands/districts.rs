use anyhow::Result;
use clap::Args;
use ecourts_lib::{PortalCatalog, PortalIdentity};

use crate::output::{print_entries_table, print_json, OutputFormat};

#[derive(Args)]
pub struct DistrictsArgs {
    /// District-portal state code (see `ecourts states`)
    #[arg(long)]
    pub state_code: String,
}

pub async fn run(args: &DistrictsArgs, format: &OutputFormat) -> Result<()> {
    ecourts_lib::validation::validate_code("state code", &args.state_code)?;

    let identity = PortalIdentity::district_court(&args.state_code, "", "");
    let mut catalog = PortalCatalog::open(identity).await?;
    let districts = catalog.districts(&args.state_code).await?;

    match format {
        OutputFormat::Table => print_entries_table(&districts),
        OutputFormat::Json => print_json(&districts),
    }
    Ok(())
}
