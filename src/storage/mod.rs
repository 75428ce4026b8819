// snapshottool/src/storage/mod.rs
pub(crate) mod s3;

use async_trait::async_trait;
use std::path::Path;

use crate::errors::Result;

pub use s3::S3Store;

/// Object store the staged snapshot is uploaded to.
///
/// One implementation talks to an S3-compatible backend; tests swap in an
/// in-memory store.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Uploads the file at `local_path` under `key`, replacing any existing
    /// object at that key. At-most-once: a failed upload leaves no object.
    async fn put_object(&self, local_path: &Path, key: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use crate::errors::SnapshotError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store used by the fake-backend tests.
    pub struct MemoryStore {
        objects: Mutex<HashMap<String, Vec<u8>>>,
        reject_auth: bool,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            MemoryStore {
                objects: Mutex::new(HashMap::new()),
                reject_auth: false,
            }
        }

        /// A store that rejects every upload as unauthenticated.
        pub fn rejecting_auth() -> Self {
            MemoryStore {
                objects: Mutex::new(HashMap::new()),
                reject_auth: true,
            }
        }

        pub fn object(&self, key: &str) -> Option<Vec<u8>> {
            self.objects.lock().unwrap().get(key).cloned()
        }

        pub fn is_empty(&self) -> bool {
            self.objects.lock().unwrap().is_empty()
        }
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn put_object(&self, local_path: &Path, key: &str) -> Result<()> {
            if self.reject_auth {
                return Err(SnapshotError::UploadAuth(
                    "invalid access key (simulated)".to_string(),
                ));
            }
            let bytes = tokio::fs::read(local_path).await?;
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), bytes);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "memory"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use crate::errors::SnapshotError;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_store_keeps_exact_bytes() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("payload.bin");
        fs::write(&file, b"snapshot bytes")?;

        let store = MemoryStore::new();
        store.put_object(&file, "prefix/payload.bin").await?;
        assert_eq!(
            store.object("prefix/payload.bin").as_deref(),
            Some(b"snapshot bytes".as_slice())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_rejecting_store_keeps_no_object() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("payload.bin");
        fs::write(&file, b"snapshot bytes")?;

        let store = MemoryStore::rejecting_auth();
        let result = store.put_object(&file, "prefix/payload.bin").await;
        assert!(matches!(result, Err(SnapshotError::UploadAuth(_))));
        assert!(store.is_empty());
        Ok(())
    }
}
