use anyhow::Result;
use tracing::{info, error};

mod api;
mod browser;
mod cli;
mod crawler;
mod services;
mod storage;
mod utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // Secrets such as SLACK_BOT_TOKEN may live in a .env file
    let dotenv_path = dotenv::dotenv().ok();

    utils::init_logging(args.verbose, args.log_file.as_deref())?;

    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }

    info!("Starting Site Archiver v{}", env!("CARGO_PKG_VERSION"));

    // Process commands
    match cli::process_command(args).await {
        Ok(_) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
