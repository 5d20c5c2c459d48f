//! R2 client creation and the `ObjectStore` implementation

use crate::config::R2Config;
use crate::error::{DriveResult, StoreError, StoreResult};
use crate::storage::{ListObjectsResult, ObjectBody, ObjectStore};
use async_trait::async_trait;
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::Client;

/// Create an S3 client configured for Cloudflare R2 (or a custom endpoint)
pub fn create_r2_client(config: &R2Config) -> DriveResult<Client> {
    config.validate()?;

    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "r2-provider",
    );

    let s3_config = S3ConfigBuilder::new()
        .credentials_provider(credentials)
        .region(Region::new(config.region_name().to_string()))
        .endpoint_url(config.endpoint())
        .force_path_style(true)
        .build();

    Ok(Client::from_conf(s3_config))
}

/// When a local file is sent as a multipart upload instead of one PUT
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartSettings {
    /// Files of at least this many bytes use multipart
    pub threshold: u64,
    pub part_size: u64,
    /// Parts in flight per file
    pub concurrency: usize,
}

impl Default for MultipartSettings {
    fn default() -> Self {
        MultipartSettings {
            threshold: 100 * 1024 * 1024, // 100MB
            part_size: 20 * 1024 * 1024,  // 20MB per part
            concurrency: 6,
        }
    }
}

/// Bucket-scoped store backed by the AWS S3 SDK
#[derive(Debug, Clone)]
pub struct R2Store {
    pub(super) client: Client,
    pub(super) bucket: String,
    pub(super) multipart: MultipartSettings,
}

impl R2Store {
    /// Fails with `ConfigMissing` before any request when credentials are blank.
    pub fn from_config(config: &R2Config) -> DriveResult<Self> {
        let client = create_r2_client(config)?;
        Ok(R2Store {
            client,
            bucket: config.bucket.clone(),
            multipart: MultipartSettings::default(),
        })
    }

    pub fn with_multipart(mut self, settings: MultipartSettings) -> Self {
        self.multipart = settings;
        self
    }
}

/// Map an SDK failure, turning HTTP 404 into `NotFound`.
pub(super) fn sdk_error<E>(op: &'static str, key: &str, err: SdkError<E>) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    if status == Some(404) {
        return StoreError::NotFound(key.to_string());
    }
    StoreError::transport(op, key, err)
}

#[async_trait]
impl ObjectStore for R2Store {
    async fn list_objects(
        &self,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> StoreResult<ListObjectsResult> {
        self.list_all(prefix, delimiter).await
    }

    async fn list_page(&self, prefix: &str, max_keys: i32) -> StoreResult<ListObjectsResult> {
        self.list_single_page(prefix, max_keys).await
    }

    async fn put_object(&self, key: &str, body: ObjectBody, content_type: &str) -> StoreResult<()> {
        self.upload_body(key, body, content_type).await
    }

    async fn copy_object(&self, source_key: &str, dest_key: &str) -> StoreResult<()> {
        self.copy(source_key, dest_key).await
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriveError;

    #[test]
    fn blank_credentials_are_refused_before_client_creation() {
        let config = R2Config {
            account_id: "acc".to_string(),
            bucket: "media".to_string(),
            access_key_id: String::new(),
            secret_access_key: "secret".to_string(),
            endpoint_url: None,
            region: None,
        };
        let err = R2Store::from_config(&config).unwrap_err();
        assert!(matches!(err, DriveError::ConfigMissing("R2_ACCESS_KEY_ID")));
    }
}
