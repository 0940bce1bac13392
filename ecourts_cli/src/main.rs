mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "ecourts")]
#[command(about = "Search Indian eCourts case status from the command line")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// History database path (overrides ECOURTS_DB)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the High Court benches
    Courts,
    /// List the district-portal states
    States,
    /// List the districts of a state
    Districts(commands::districts::DistrictsArgs),
    /// List case types for a court
    CaseTypes(commands::case_types::CaseTypesArgs),
    /// Run a case-status search
    Search(Box<commands::search::SearchArgs>),
    /// Show recent searches and their outcomes
    History(commands::history::HistoryArgs),
}

fn database_path(cli: &Cli) -> String {
    cli.db
        .clone()
        .or_else(|| std::env::var("ECOURTS_DB").ok())
        .unwrap_or_else(|| "ecourts_history.db".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ecourts=info".parse()?),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Courts => commands::courts::run(&format),
        Commands::States => commands::states::run(&format),
        Commands::Districts(args) => commands::districts::run(args, &format).await?,
        Commands::CaseTypes(args) => commands::case_types::run(args, &format).await?,
        Commands::Search(args) => {
            commands::search::run(args.as_ref(), &database_path(&cli), &format).await?
        }
        Commands::History(args) => commands::history::run(args, &database_path(&cli), &format)?,
    }

    Ok(())
}
