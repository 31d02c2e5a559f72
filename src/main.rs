//! sql-digest - turn MySQL tables into text for downstream pipelines.

use sql_digest::cli::{Cli, Command};
use sql_digest::config::Config;
use sql_digest::error::Result;
use sql_digest::logging::init_stderr_logging;
use sql_digest::output::OutputRecord;
use sql_digest::pipeline;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_stderr_logging();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = cli.resolve_connection(&config)?;

    let record = match &cli.command {
        Command::Extract(args) => {
            let settings = args.apply(&config.extract);
            pipeline::extract(&connection, &settings).await
        }
        Command::Report(args) => {
            let settings = args.apply(&config.report);
            pipeline::report(&connection, &settings).await
        }
    };

    print_record(&record, cli.json)
}

fn print_record(record: &OutputRecord, json: bool) -> Result<()> {
    if json {
        println!("{}", record.to_json()?);
    } else {
        println!("{}", record.text());
    }
    Ok(())
}
