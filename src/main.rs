//! African Markets ETL entry point

use african_markets_etl::db::Db;
use african_markets_etl::etl::processor::EtlProcessor;
use african_markets_etl::report;
use african_markets_etl::scheduler::JobScheduler;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "african-markets-etl", version)]
#[command(about = "Scheduled ETL service for African stock exchange market data")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, default_value = "african_markets.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once, for one exchange or all of them
    Run {
        /// Exchange code (JSE, NGX or BRVM); all exchanges when omitted
        #[arg(long)]
        exchange: Option<String>,
    },
    /// Start the daily scheduler and run until interrupted
    Serve,
    /// Print the end-of-day market summary from stored data
    Summary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let db = Arc::new(Db::new(&cli.db)?);

    match cli.command {
        Command::Run { exchange } => {
            let processor = EtlProcessor::new(db);
            match exchange {
                Some(code) => {
                    let code = code.trim().to_uppercase();
                    let summary = processor.process_exchange(&code).await;
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                None => {
                    let summaries = processor.process_all().await;
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                }
            }
        }
        Command::Serve => {
            let processor = Arc::new(EtlProcessor::new(db));
            let handles = JobScheduler::with_default_jobs().run(processor);
            tracing::info!("Scheduler running {} jobs, Ctrl-C to stop", handles.len());
            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down");
        }
        Command::Summary => {
            print!("{}", report::generate_market_summary(&db)?);
        }
    }

    Ok(())
}
