// snapshottool/src/storage/s3.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_smithy_types::timeout::TimeoutConfig;
use s3::config::Region;
use s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use s3::operation::put_object::PutObjectError;
use s3::primitives::ByteStream;
use s3::types::ObjectCannedAcl;
use std::path::Path;
use tracing::info;

use crate::config::StorageConfig;
use crate::errors::{Result, SnapshotError};
use crate::storage::SnapshotStore;

/// S3-compatible object store. Every object is written with a public-read
/// canned ACL, matching the snapshot's distribution model.
pub struct S3Store {
    config: StorageConfig,
}

impl S3Store {
    pub fn new(config: StorageConfig) -> Self {
        S3Store { config }
    }

    async fn client(&self) -> s3::Client {
        // The reference ran without any timeout; an explicit operation
        // timeout bounds the upload instead of hanging indefinitely.
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(self.config.operation_timeout)
            .build();

        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .region(Region::new(self.config.region.clone()))
            .timeout_config(timeout_config)
            .credentials_provider(s3::config::Credentials::new(
                &self.config.access_key_id,
                &self.config.secret_access_key,
                None,
                None,
                "Static",
            ));
        if let Some(endpoint) = &self.config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        s3::Client::new(&sdk_config)
    }
}

#[async_trait]
impl SnapshotStore for S3Store {
    async fn put_object(&self, local_path: &Path, key: &str) -> Result<()> {
        info!(
            "uploading {} to bucket {} with key {}",
            local_path.display(),
            self.config.bucket_name,
            key
        );

        let client = self.client().await;

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| SnapshotError::Io(std::io::Error::other(e)))?;

        client
            .put_object()
            .bucket(&self.config.bucket_name)
            .key(key)
            .body(body)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(classify_put_error)?;

        info!(
            "uploaded {} to bucket {} with key {}",
            local_path.display(),
            self.config.bucket_name,
            key
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

/// Splits backend failures into the kinds the orchestrator reports on:
/// authentication, transport, or any other backend rejection.
fn classify_put_error(err: SdkError<PutObjectError>) -> SnapshotError {
    let detail = format!("{}", DisplayErrorContext(&err));
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            SnapshotError::UploadNetwork(detail)
        }
        SdkError::ServiceError(ctx) => match ctx.err().code() {
            Some(
                "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken"
                | "TokenRefreshRequired",
            ) => SnapshotError::UploadAuth(detail),
            _ => SnapshotError::UploadRejected(detail),
        },
        _ => SnapshotError::UploadRejected(detail),
    }
}
