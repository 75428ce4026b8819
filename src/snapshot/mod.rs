pub(crate) mod archive;
mod logic;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::storage::S3Store;

pub use logic::SnapshotOutcome;

/// Public entry point for the snapshot pipeline.
/// Runs one stop-archive-upload-restart cycle against the real S3 backend.
pub async fn run_snapshot_flow(config: &AppConfig) -> Result<SnapshotOutcome> {
    let store = S3Store::new(config.storage.clone());
    logic::perform_snapshot_orchestration(config, &store).await
}
