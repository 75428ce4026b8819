//! Blockchain Snapshot & Upload Tool
//!
//! Archives a local blockchain database directory, uploads the archive to an
//! object-storage bucket, and restarts the node process around the operation.
//! One pipeline run per invocation; failure is signalled through the exit
//! code and the run log.

// snapshottool/src/main.rs
mod config;
mod errors;
mod node;
mod snapshot;
mod storage;
mod utils;

use anyhow::{Context, Result};
use config::AppConfig;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    match run_app().await {
        Ok(true) => {
            println!("✅ Snapshot uploaded successfully.");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            eprintln!("❌ Snapshot run failed. See the run log for details.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("❌ Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<bool> {
    // Optional config.json next to the binary; defaults apply when absent.
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.json"));

    let app_config = AppConfig::load(&config_path).context(format!(
        "Failed to load configuration (config file: {})",
        config_path.display()
    ))?;

    utils::prepare_base_dirs(&app_config).context("Failed to create staging/logs directories")?;
    utils::logging::init(&app_config.log_file()).context("Failed to initialize logging")?;

    println!("🚀 Starting snapshot of {}", app_config.source_dir.display());
    let outcome = snapshot::run_snapshot_flow(&app_config).await?;

    if let Some(key) = &outcome.object_key {
        println!("🗜 Uploaded object key: {key}");
    }
    Ok(outcome.succeeded())
}
