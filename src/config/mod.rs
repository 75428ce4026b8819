// snapshottool/src/config/mod.rs
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, SnapshotError};
use crate::snapshot::archive::ArchiveFormat;

// Defaults matching the reference deployment; every one of them can be
// overridden through config.json.
const DEFAULT_SOURCE_SUFFIX: &str = ".ironfish/databases/default";
const DEFAULT_STAGING_SUFFIX: &str = "upload";
const DEFAULT_LOGS_SUFFIX: &str = "logs";
const DEFAULT_BASE_NAME: &str = "ironfish_db";
const DEFAULT_BUCKET: &str = "y3oclgak3p951zai";
const DEFAULT_KEY_PREFIX: &str = "IronFishBlockchain/";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_NODE_PROCESS: &str = "ironfish";
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 900;

pub const LOG_FILE_NAME: &str = "app.log";

// Structs for deserializing config.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub source_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub archive_base_name: Option<String>,
    pub archive_format: Option<String>,
    pub storage: Option<JsonStorageConfig>,
    pub node: Option<JsonNodeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonStorageConfig {
    pub bucket_name: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub key_prefix: Option<String>,
    pub operation_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonNodeConfig {
    pub manage: Option<bool>,
    pub process_name: Option<String>,
    pub start_command: Option<Vec<String>>,
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket_name: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub key_prefix: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub operation_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub process_name: String,
    pub start_command: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub base_name: String,
    pub format: ArchiveFormat,
}

impl ArchiveConfig {
    /// File name of the staged archive, e.g. `ironfish_db.zip`. Deterministic:
    /// no timestamp, no randomness, so each run overwrites the previous one.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.base_name, self.format.extension())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub source_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub archive: ArchiveConfig,
    pub storage: StorageConfig,
    pub node: Option<NodeConfig>,
}

impl AppConfig {
    /// Loads configuration from an optional config.json plus the environment.
    ///
    /// Missing credentials or a missing HOME are fatal preconditions and fail
    /// here, before any pipeline stage runs.
    pub fn load(config_path: &Path) -> Result<Self> {
        let raw = if config_path.is_file() {
            let content = fs::read_to_string(config_path)?;
            serde_json::from_str(&content).map_err(|e| {
                SnapshotError::Config(format!(
                    "Failed to parse JSON from config file at {}: {e}",
                    config_path.display()
                ))
            })?
        } else {
            RawJsonConfig::default()
        };
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawJsonConfig) -> Result<Self> {
        let home = PathBuf::from(require_env("HOME")?);

        let access_key_id = require_env("ACCESS_KEY")?;
        let secret_access_key = require_env("SECRET_KEY")?;

        let format = match &raw.archive_format {
            Some(s) => s.parse::<ArchiveFormat>()?,
            None => ArchiveFormat::Zip,
        };

        let storage_raw = raw.storage.unwrap_or_default();

        if let Some(endpoint) = storage_raw.endpoint_url.as_deref() {
            validate_endpoint_url(endpoint)?;
        }

        let storage = StorageConfig {
            bucket_name: non_empty(storage_raw.bucket_name, DEFAULT_BUCKET),
            region: non_empty(storage_raw.region, DEFAULT_REGION),
            endpoint_url: storage_raw.endpoint_url.filter(|s| !s.is_empty()),
            key_prefix: normalize_key_prefix(non_empty(storage_raw.key_prefix, DEFAULT_KEY_PREFIX)),
            access_key_id,
            secret_access_key,
            operation_timeout: Duration::from_secs(
                storage_raw
                    .operation_timeout_secs
                    .unwrap_or(DEFAULT_UPLOAD_TIMEOUT_SECS),
            ),
        };

        Ok(AppConfig {
            source_dir: raw.source_dir.unwrap_or_else(|| home.join(DEFAULT_SOURCE_SUFFIX)),
            staging_dir: raw.staging_dir.unwrap_or_else(|| home.join(DEFAULT_STAGING_SUFFIX)),
            logs_dir: raw.logs_dir.unwrap_or_else(|| home.join(DEFAULT_LOGS_SUFFIX)),
            archive: ArchiveConfig {
                base_name: non_empty(raw.archive_base_name, DEFAULT_BASE_NAME),
                format,
            },
            storage,
            node: resolve_node_config(raw.node),
        })
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join(LOG_FILE_NAME)
    }

    /// Full path of the staged archive for this run.
    pub fn archive_path(&self) -> PathBuf {
        self.staging_dir.join(self.archive.file_name())
    }

    /// Remote object key: logical prefix plus the archive file name.
    pub fn object_key(&self) -> String {
        format!("{}{}", self.storage.key_prefix, self.archive.file_name())
    }
}

fn require_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SnapshotError::Config(format!(
            "{name} must be set in the environment"
        ))),
    }
}

fn non_empty(value: Option<String>, default: &str) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Object keys are built by plain concatenation, so a non-empty prefix must
/// end with a separator.
fn normalize_key_prefix(mut prefix: String) -> String {
    if !prefix.is_empty() && !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}

fn validate_endpoint_url(endpoint: &str) -> Result<()> {
    let parsed = url::Url::parse(endpoint)
        .map_err(|e| SnapshotError::Config(format!("Invalid endpoint_url {endpoint}: {e}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(SnapshotError::Config(format!(
            "endpoint_url must be http(s), got: {endpoint}"
        )));
    }
    Ok(())
}

fn resolve_node_config(raw: Option<JsonNodeConfig>) -> Option<NodeConfig> {
    let raw = raw.unwrap_or_default();
    if !raw.manage.unwrap_or(true) {
        return None;
    }
    let process_name = non_empty(raw.process_name, DEFAULT_NODE_PROCESS);
    let start_command = match raw.start_command {
        Some(cmd) if !cmd.is_empty() => cmd,
        _ => vec![process_name.clone(), "start".to_string()],
    };
    Some(NodeConfig {
        process_name,
        start_command,
    })
}
