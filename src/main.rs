use live_tally::commands::{self, parse_args};
use live_tally::config::Config;
use live_tally::db::{CollectionStore, Database};
use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let config = Config::from_env();

    // Initialize database
    let store: Arc<dyn CollectionStore> = match Database::connect(&config.database_url).await {
        Ok(db) => {
            info!("Connected to {}", config.database_url);
            Arc::new(db)
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match commands::run(command, store, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
