//! RugbyBot CLI
//!
//! Answers rugby questions from the command line.

mod cli;
mod commands;
mod output;
mod telemetry;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{debug, error};

use crate::cli::{Args, Command};
use crate::output::OutputFormat;
use crate::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init_telemetry(&args)?;
    debug!("Version: {}", env!("CARGO_PKG_VERSION"));

    let result = run(args).await;
    if let Err(ref e) = result {
        error!("Command failed: {:#}", e);
    }
    result
}

async fn run(args: Args) -> Result<()> {
    let format: OutputFormat = args.format.parse().map_err(|e: String| anyhow!(e))?;

    match args.command {
        Command::Ask { query } => commands::ask::run(&query, format).await,
        Command::Chat => commands::chat::run(format).await,
        Command::Classify { query, model } => {
            commands::classify::run(&query, model.as_deref(), format).await
        }
        Command::Entities { query } => commands::entities::run(&query, format),
    }
}
