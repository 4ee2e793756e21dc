//! S3 object storage client
//!
//! Uploads screenshots with a short-lived presigned `PUT` and hands back a
//! presigned `GET` link that stays valid for seven days.

pub mod signing;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Client;
use uuid::Uuid;

use crate::config::{S3Config, ServiceConfig, DEFAULT_PROVIDER};
use crate::core::{ObjectStorage, ServiceClient};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, parse_error_response, UserAgent};

pub use signing::Signer;

/// Lifetime of the presigned URL used for the upload itself
const UPLOAD_URL_EXPIRY_SECONDS: u64 = 15 * 60;

/// S3 client
pub struct S3Client {
    http_client: Client,
    config: S3Config,
    signer: Signer,
}

impl S3Client {
    /// Create a client from the process environment (`AWS_S3_*` variables)
    pub fn from_env() -> Result<Self> {
        let config = S3Config::from_provider(&**DEFAULT_PROVIDER)?;
        Self::new_with_config(config)
    }

    /// Create a new S3 client with custom configuration
    pub fn new_with_config(config: S3Config) -> Result<Self> {
        config.validate()?;

        let http_client = build_http_client(
            Some(UserAgent::for_client("S3-Client")),
            Some(Duration::from_secs(config.timeout_seconds)),
        )?;
        let signer = Signer::new(&config.access_key, &config.secret_key, &config.region);

        Ok(Self {
            http_client,
            config,
            signer,
        })
    }

    /// Object key for an uploaded file: `uploads/<prefix>/<uuid><.ext>`
    pub fn object_key(&self, file_name: &str) -> String {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        format!(
            "uploads/{}/{}{}",
            self.config.key_prefix.trim_matches('/'),
            Uuid::new_v4(),
            extension
        )
    }

    /// Addressable URL of `key`, path style for custom endpoints
    pub fn object_url(&self, key: &str) -> String {
        match &self.config.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.config.bucket, key),
            None => self.virtual_hosted_url(key),
        }
    }

    /// Unsigned link handed out when presigning fails
    pub fn fallback_url(&self, key: &str) -> String {
        match &self.config.base_url {
            Some(base_url) => format!("{}/{}", base_url.trim_end_matches('/'), key),
            None => self.virtual_hosted_url(key),
        }
    }

    fn virtual_hosted_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.config.bucket, self.config.region, key
        )
    }

    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let acl = ("x-amz-acl", "private");
        let put_url = self.signer.presign(
            "PUT",
            &self.object_url(key),
            UPLOAD_URL_EXPIRY_SECONDS,
            &[acl],
            Utc::now(),
        )?;

        debug!("Uploading {} bytes to S3 key {}", bytes.len(), key);

        let response = self
            .http_client
            .put(&put_url)
            .header(acl.0, acl.1)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(parse_error_response("s3", key, response).await)
        }
    }
}

#[async_trait]
impl ServiceClient for S3Client {
    fn name(&self) -> &str {
        "s3"
    }

    fn base_url(&self) -> &str {
        self.config
            .endpoint
            .as_deref()
            .or(self.config.base_url.as_deref())
            .unwrap_or("https://s3.amazonaws.com")
    }

    async fn health_check(&self) -> Result<bool> {
        let bucket_url = self.object_url("");
        let signed = self.signer.presign("HEAD", &bucket_url, 60, &[], Utc::now())?;

        match self.http_client.head(&signed).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("S3 health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Client {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str, file_name: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(ServiceError::validation("Refusing to upload an empty file"));
        }

        let key = self.object_key(file_name);
        self.put_object(&key, bytes, content_type).await?;
        info!("Uploaded {} to s3://{}/{}", file_name, self.config.bucket, key);

        match self.signer.presign(
            "GET",
            &self.object_url(&key),
            self.config.presign_expiry_seconds,
            &[],
            Utc::now(),
        ) {
            Ok(url) => Ok(url),
            Err(e) => {
                let url = self.fallback_url(&key);
                warn!("Failed to presign download link, using {}: {}", url, e);
                Ok(url)
            }
        }
    }
}
