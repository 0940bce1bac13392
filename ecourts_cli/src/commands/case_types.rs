use anyhow::{bail, Result};
use clap::Args;
use ecourts_lib::{PortalCatalog, PortalIdentity};

use crate::output::{print_entries_table, print_json, OutputFormat};

#[derive(Args)]
pub struct CaseTypesArgs {
    /// Portal family: high-court or district
    #[arg(long, default_value = "high-court")]
    pub portal: String,

    /// High Court bench code (high-court only)
    #[arg(long)]
    pub court_code: Option<String>,

    /// State code (both portals)
    #[arg(long)]
    pub state_code: String,

    /// District code (district only)
    #[arg(long)]
    pub district_code: Option<String>,

    /// Court complex code, `complex@establishment@flag` (district only)
    #[arg(long)]
    pub complex_code: Option<String>,
}

pub fn identity(args: &CaseTypesArgs) -> Result<PortalIdentity> {
    match args.portal.as_str() {
        "high-court" => {
            let Some(court_code) = &args.court_code else {
                bail!("--court-code is required for the high-court portal");
            };
            Ok(PortalIdentity::high_court(court_code, &args.state_code))
        }
        "district" => {
            let (Some(district_code), Some(complex_code)) =
                (&args.district_code, &args.complex_code)
            else {
                bail!("--district-code and --complex-code are required for the district portal");
            };
            Ok(PortalIdentity::district_court(
                &args.state_code,
                district_code,
                complex_code,
            ))
        }
        other => bail!("unknown portal {other:?}, expected high-court or district"),
    }
}

pub async fn run(args: &CaseTypesArgs, format: &OutputFormat) -> Result<()> {
    let mut catalog = PortalCatalog::open(identity(args)?).await?;
    let case_types = catalog.case_types().await?;

    match format {
        OutputFormat::Table => print_entries_table(&case_types),
        OutputFormat::Json => print_json(&case_types),
    }
    Ok(())
}
