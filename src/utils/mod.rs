pub mod logging;

use std::fs;

use crate::config::AppConfig;
use crate::errors::Result;

/// Creates the staging and logs directories if they are absent. The source
/// directory is deliberately not created: its absence is an archiving error,
/// not something to paper over.
pub fn prepare_base_dirs(config: &AppConfig) -> Result<()> {
    fs::create_dir_all(&config.staging_dir)?;
    fs::create_dir_all(&config.logs_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArchiveConfig, StorageConfig};
    use crate::snapshot::archive::ArchiveFormat;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_prepare_base_dirs_creates_missing_dirs() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = AppConfig {
            source_dir: dir.path().join("database"),
            staging_dir: dir.path().join("upload"),
            logs_dir: dir.path().join("logs"),
            archive: ArchiveConfig {
                base_name: "ironfish_db".to_string(),
                format: ArchiveFormat::Zip,
            },
            storage: StorageConfig {
                bucket_name: "bucket".to_string(),
                region: "us-east-1".to_string(),
                endpoint_url: None,
                key_prefix: String::new(),
                access_key_id: "k".to_string(),
                secret_access_key: "s".to_string(),
                operation_timeout: Duration::from_secs(1),
            },
            node: None,
        };

        prepare_base_dirs(&config)?;
        assert!(config.staging_dir.is_dir());
        assert!(config.logs_dir.is_dir());
        assert!(!config.source_dir.exists());
        Ok(())
    }
}
