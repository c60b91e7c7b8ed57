#![cfg(not(tarpaulin_include))]

use clap::Parser;
use std::path::PathBuf;

use refill::RefillConfig;
use refill::app;

#[derive(Parser)]
#[command(name = "refill-web", about = "Serve the inventory refill report page")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Main entry point for the web application
///
/// Loads the optional configuration file and serves the upload page and API
/// until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => RefillConfig::load(path)?,
        None => RefillConfig::default(),
    };

    app::run(&args.bind, config).await
}
