// snapshottool/src/snapshot/logic.rs
use chrono::Utc;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::node;
use crate::snapshot::archive;
use crate::storage::SnapshotStore;

/// Result of one pipeline run. The run as a whole succeeded only if both the
/// archive and the upload stage did.
#[derive(Debug)]
pub struct SnapshotOutcome {
    pub archived: bool,
    pub uploaded: bool,
    pub archive_path: Option<PathBuf>,
    pub object_key: Option<String>,
    pub elapsed: Duration,
}

impl SnapshotOutcome {
    pub fn succeeded(&self) -> bool {
        self.archived && self.uploaded
    }
}

/// Sequences one snapshot run: stop node, archive, upload, restart node.
///
/// Stage failures are logged and folded into the outcome; they never abort
/// the run early, so the node restart is always attempted. Only fatal setup
/// problems (none today past config load) would return Err.
pub async fn perform_snapshot_orchestration(
    config: &AppConfig,
    store: &dyn SnapshotStore,
) -> Result<SnapshotOutcome> {
    let started_at = Utc::now();
    let timer = Instant::now();
    info!("---------- snapshot run started: {started_at} ----------");

    if let Some(node_config) = &config.node {
        node::stop_node(&node_config.process_name);
    }

    let archive_path = config.archive_path();
    let archive_start = Instant::now();
    let archived = match archive::create_archive(
        &config.source_dir,
        &archive_path,
        config.archive.format,
    ) {
        Ok(_) => {
            info!("archiving finished in {:.2?}", archive_start.elapsed());
            true
        }
        Err(e) => {
            error!("archiving failed: {e}");
            false
        }
    };

    let object_key = config.object_key();
    let uploaded = if archived {
        let upload_start = Instant::now();
        match store.put_object(&archive_path, &object_key).await {
            Ok(()) => {
                info!(
                    "upload to {} finished in {:.2?}",
                    store.name(),
                    upload_start.elapsed()
                );
                true
            }
            Err(e) => {
                error!("upload failed: {e}");
                false
            }
        }
    } else {
        warn!("skipping upload: no archive was produced");
        false
    };

    // Restart regardless of how the earlier stages went: the node must not
    // stay down because a backup failed.
    if let Some(node_config) = &config.node {
        match node::start_node(&node_config.start_command) {
            Ok(pid) => {
                info!("node restart requested (pid {pid})");
                if !node::is_node_running(&node_config.process_name) {
                    warn!(
                        "node process {} not visible after launch request",
                        node_config.process_name
                    );
                }
            }
            Err(e) => error!("node restart failed: {e}"),
        }
    }

    let outcome = SnapshotOutcome {
        archived,
        uploaded,
        archive_path: archived.then_some(archive_path),
        object_key: uploaded.then_some(object_key),
        elapsed: timer.elapsed(),
    };

    if !outcome.succeeded() {
        error!(
            "snapshot run failed. archived: {}, uploaded: {}",
            outcome.archived, outcome.uploaded
        );
    }
    info!(
        "---------- snapshot run ended: {} (total {:.2?}) ----------",
        Utc::now(),
        outcome.elapsed
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchiveConfig, NodeConfig, StorageConfig};
    use crate::snapshot::archive::ArchiveFormat;
    use crate::storage::memory::MemoryStore;
    use std::fs;
    use std::io::Read;
    use std::path::Path;
    use tempfile::tempdir;

    fn test_config(root: &Path, source_dir: PathBuf) -> AppConfig {
        AppConfig {
            source_dir,
            staging_dir: root.join("upload"),
            logs_dir: root.join("logs"),
            archive: ArchiveConfig {
                base_name: "ironfish_db".to_string(),
                format: ArchiveFormat::Zip,
            },
            storage: StorageConfig {
                bucket_name: "test-bucket".to_string(),
                region: "us-east-1".to_string(),
                endpoint_url: None,
                key_prefix: "IronFishBlockchain/".to_string(),
                access_key_id: "test".to_string(),
                secret_access_key: "test".to_string(),
                operation_timeout: Duration::from_secs(30),
            },
            node: None,
        }
    }

    fn make_source(root: &Path) -> anyhow::Result<PathBuf> {
        let source = root.join("database");
        fs::create_dir_all(source.join("sub"))?;
        fs::write(source.join("a.txt"), "hello")?;
        fs::write(source.join("sub/b.txt"), "world")?;
        Ok(source)
    }

    fn zip_entry(bytes: &[u8], name: &str) -> anyhow::Result<String> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))?;
        let mut entry = archive.by_name(name)?;
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        Ok(content)
    }

    #[tokio::test]
    async fn test_full_pipeline_archives_and_uploads() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let source = make_source(dir.path())?;
        let config = test_config(dir.path(), source);
        let store = MemoryStore::new();

        let outcome = perform_snapshot_orchestration(&config, &store).await?;
        assert!(outcome.succeeded());

        let staged = dir.path().join("upload/ironfish_db.zip");
        assert!(staged.is_file());
        assert_eq!(outcome.archive_path.as_deref(), Some(staged.as_path()));
        assert_eq!(
            outcome.object_key.as_deref(),
            Some("IronFishBlockchain/ironfish_db.zip")
        );

        let object = store
            .object("IronFishBlockchain/ironfish_db.zip")
            .expect("object should be stored");
        assert_eq!(object, fs::read(&staged)?);
        assert_eq!(zip_entry(&object, "a.txt")?, "hello");
        assert_eq!(zip_entry(&object, "sub/b.txt")?, "world");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_fails_but_still_restarts_node() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let mut config = test_config(dir.path(), dir.path().join("no-such-database"));
        // Restart must still be attempted; a bogus node exercises that path
        // without depending on a real process.
        config.node = Some(NodeConfig {
            process_name: "snapshottool-no-such-process".to_string(),
            start_command: vec!["snapshottool-no-such-binary".to_string()],
        });
        let store = MemoryStore::new();

        let outcome = perform_snapshot_orchestration(&config, &store).await?;
        assert!(!outcome.archived);
        assert!(!outcome.uploaded);
        assert!(!outcome.succeeded());
        assert!(store.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_auth_rejection_fails_upload_stage() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let source = make_source(dir.path())?;
        let config = test_config(dir.path(), source);
        let store = MemoryStore::rejecting_auth();

        let outcome = perform_snapshot_orchestration(&config, &store).await?;
        assert!(outcome.archived);
        assert!(!outcome.uploaded);
        assert!(!outcome.succeeded());
        assert!(store.is_empty());
        Ok(())
    }
}
