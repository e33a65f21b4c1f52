use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Lifetime of a presigned receipt upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// Largest receipt a client may declare for upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid presigning config: {0}")]
    Config(String),
    #[error("failed to presign upload: {0}")]
    Presign(String),
}

/// StorageService
///
/// Object storage for uploaded receipts. The server only hands out presigned
/// URLs; file bytes never pass through it.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the bucket if missing. Only called for local MinIO.
    async fn ensure_bucket_exists(&self);

    /// Presigned PUT URL for `key`, valid for `UPLOAD_URL_TTL`. When `content_type`
    /// or `content_length` is given the upload must carry exactly that header.
    async fn presign_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        content_length: Option<u64>,
    ) -> Result<String, StorageError>;
}

/// S3StorageClient
///
/// AWS S3 in production, MinIO locally. A custom endpoint switches on
/// path-style addressing, which MinIO requires.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub fn new(
        endpoint: Option<&str>,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let mut builder = s3::Config::builder()
            .credentials_provider(credentials)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest();

        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: s3::Client::from_conf(builder.build()),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            // Already-exists is reported as an error too.
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket failed");
        }
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: Option<&str>,
        content_length: Option<u64>,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let mut request = self.client.put_object().bucket(&self.bucket_name).key(key);
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        if let Some(length) = content_length {
            let length = i64::try_from(length).map_err(|_| {
                StorageError::Config(format!("content length {length} out of range"))
            })?;
            request = request.content_length(length);
        }

        let presigned = request
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a user-supplied file name cannot climb
/// out of its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Object key for an uploaded receipt: `receipts/<sanitized file name>`.
pub fn receipt_key(file_name: &str) -> Option<String> {
    let sanitized = sanitize_key(file_name);
    (!sanitized.is_empty()).then(|| format!("receipts/{sanitized}"))
}

/// MockStorageService
///
/// Deterministic `StorageService` for tests; no network.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
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

    async fn presign_upload(
        &self,
        key: &str,
        _content_type: Option<&str>,
        content_length: Option<u64>,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Presign("simulated failure".to_string()));
        }

        let mut url = format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        );
        if let Some(length) = content_length {
            url.push_str(&format!("&content-length={length}"));
        }
        Ok(url)
    }
}

/// StorageState
///
/// The shared handle to object storage.
pub type StorageState = Arc<dyn StorageService>;
