use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::UploadFolder;

/// How long a presigned upload URL stays valid.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// StorageService
///
/// Object storage for project covers and client portraits. The dashboard uploads
/// images straight to the bucket with a presigned URL and then stores the returned
/// key on the Project/Client record.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if missing. Only called in `Env::Local` (MinIO).
    async fn ensure_bucket_exists(&self);

    /// Signs a PUT for `key`, pinned to `content_type`.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String>;
}

/// S3StorageClient
///
/// `aws-sdk-s3` client that works against MinIO locally and any S3-compatible
/// endpoint in production. Path-style addressing is forced for MinIO.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub fn new(endpoint: &str, region: &str, access_key: &str, secret_key: &str, bucket: &str) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.s3_endpoint,
            &config.s3_region,
            &config.s3_key,
            &config.s3_secret,
            &config.s3_bucket,
        )
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket already exists.
        if let Err(err) = self.client.create_bucket().bucket(&self.bucket_name).send().await {
            tracing::debug!(bucket = %self.bucket_name, error = %err, "create_bucket skipped");
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, String> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }
}

/// image_key
///
/// Builds `<folder>/<uuid>.<ext>` from the client's filename. Only the extension
/// of the supplied name survives, so it cannot steer the key elsewhere.
pub fn image_key(folder: UploadFolder, filename: &str) -> String {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    format!("{}/{}.{}", folder.prefix(), Uuid::new_v4(), extension)
}

/// MockStorageService
///
/// Returns a deterministic local URL for the key, or an error with `should_fail`.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        Ok(format!("http://localhost:9000/mock-bucket/{key}?signature=fake"))
    }
}

pub type StorageState = Arc<dyn StorageService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_keeps_folder_and_extension_only() {
        let key = image_key(UploadFolder::Projects, "../../etc/Hero.PNG");
        assert!(key.starts_with("projects/"));
        assert!(key.ends_with(".png"));
        assert_eq!(key.matches('/').count(), 1);
    }

    #[test]
    fn odd_extensions_fall_back_to_bin() {
        assert!(image_key(UploadFolder::Clients, "portrait").ends_with(".bin"));
        assert!(image_key(UploadFolder::Clients, "a.p/g").ends_with(".bin"));
    }

    #[tokio::test]
    async fn mock_signs_or_fails() {
        let url = MockStorageService::new()
            .get_presigned_upload_url("clients/x.png", "image/png")
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:9000/mock-bucket/clients/x.png?signature=fake");

        assert!(
            MockStorageService::new_failing()
                .get_presigned_upload_url("clients/x.png", "image/png")
                .await
                .is_err()
        );
    }
}
