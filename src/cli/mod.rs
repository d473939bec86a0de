pub mod commands;
pub mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::cli::config::ServiceConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Crawl a website in the foreground and archive it to a Drive folder
    Crawl {
        /// Seed URL; only links starting with it are followed
        #[arg(required = true)]
        url: String,

        /// Drive folder the site folder is created in
        #[arg(short, long)]
        folder: String,

        /// Maximum number of pages to archive
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Show the effective configuration
    Config,
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    let config = ServiceConfig::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve { host: None, port: None }) {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            commands::serve(config, host, port).await
        },
        Commands::Crawl { url, folder, limit } => {
            info!("Starting crawl on {} into folder {}", url, folder);
            commands::crawl(config, url, folder, limit).await
        },
        Commands::Config => {
            commands::show_config(&config, cli.config.as_deref())
        },
    }
}
