//! S3-compatible object store client (MinIO in development).
//!
//! All requests are SigV4-signed; presigned URLs let clients upload and
//! download directly against the store without proxying through the API.

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;

use crate::domain::error::AppError;
use crate::infra::config::StorageConfig;
use crate::storage::object::keys::ALL_BUCKETS;
use crate::storage::object::sigv4::{
    self, canonical_path, canonical_query, Credentials, RequestToSign,
};

#[derive(Clone)]
pub struct ObjectStore {
    http: reqwest::Client,
    cfg: StorageConfig,
}

impl ObjectStore {
    pub fn new(cfg: StorageConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(ObjectStore { http, cfg })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.cfg
    }

    fn scheme(&self) -> &'static str {
        if self.cfg.use_ssl {
            "https"
        } else {
            "http"
        }
    }

    fn credentials(&self) -> Credentials<'_> {
        Credentials {
            access_key: &self.cfg.access_key_id,
            secret_key: &self.cfg.secret_access_key,
            region: &self.cfg.region,
        }
    }

    fn signed_headers(&self, method: &str, path: &str) -> anyhow::Result<HeaderMap> {
        let req = RequestToSign {
            method,
            host: &self.cfg.endpoint,
            path,
            query: Vec::new(),
            timestamp: Utc::now(),
        };
        let mut headers = HeaderMap::new();
        for (name, value) in sigv4::sign_headers(&self.credentials(), &req) {
            headers.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(&value)?,
            );
        }
        Ok(headers)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}://{}{}", self.scheme(), self.cfg.endpoint, canonical_path(path))
    }

    /// Creates the bucket if it does not exist yet.
    pub async fn ensure_bucket(&self, bucket: &str) -> anyhow::Result<()> {
        let path = format!("/{}", bucket);
        let headers = self.signed_headers("PUT", &path)?;
        let resp = self
            .http
            .put(self.url_for(&path))
            .headers(headers)
            .send()
            .await?;
        match resp.status() {
            StatusCode::OK | StatusCode::CONFLICT => Ok(()),
            status => anyhow::bail!("bucket creation for {} failed with {}", bucket, status),
        }
    }

    /// Ensures every bucket the platform uses.
    pub async fn ensure_buckets(&self) -> anyhow::Result<()> {
        for bucket in ALL_BUCKETS {
            self.ensure_bucket(bucket).await?;
        }
        Ok(())
    }

    /// Cheap reachability probe used by the health endpoint.
    pub async fn bucket_exists(&self, bucket: &str) -> bool {
        let path = format!("/{}", bucket);
        let Ok(headers) = self.signed_headers("HEAD", &path) else {
            return false;
        };
        match self.http.head(self.url_for(&path)).headers(headers).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        let path = format!("/{}/{}", bucket, key);
        let mut headers = self
            .signed_headers("PUT", &path)
            .map_err(AppError::internal)?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        );
        let resp = self
            .http
            .put(self.url_for(&path))
            .headers(headers)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("object upload failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(AppError::internal(anyhow::anyhow!(
                "object upload failed with {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Fetches an object; the response is streamed back to the caller with its
    /// stored content type and length.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<reqwest::Response, AppError> {
        let path = format!("/{}/{}", bucket, key);
        let headers = self
            .signed_headers("GET", &path)
            .map_err(AppError::internal)?;
        let resp = self
            .http
            .get(self.url_for(&path))
            .headers(headers)
            .send()
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("object fetch failed: {e}")))?;
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::NOT_FOUND => Err(AppError::NotFound("file")),
            status => Err(AppError::internal(anyhow::anyhow!(
                "object fetch failed with {}",
                status
            ))),
        }
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AppError> {
        let path = format!("/{}/{}", bucket, key);
        let headers = self
            .signed_headers("DELETE", &path)
            .map_err(AppError::internal)?;
        let resp = self
            .http
            .delete(self.url_for(&path))
            .headers(headers)
            .send()
            .await
            .map_err(|e| AppError::internal(anyhow::anyhow!("object delete failed: {e}")))?;
        // S3 delete is idempotent: 204 for deleted, 404 tolerated.
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            return Err(AppError::internal(anyhow::anyhow!(
                "object delete failed with {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Presigned URL for a direct client upload.
    pub fn presign_put(&self, bucket: &str, key: &str, expires: Duration) -> String {
        self.presign("PUT", bucket, key, expires)
    }

    /// Presigned URL for a direct client download.
    pub fn presign_get(&self, bucket: &str, key: &str, expires: Duration) -> String {
        self.presign("GET", bucket, key, expires)
    }

    fn presign(&self, method: &str, bucket: &str, key: &str, expires: Duration) -> String {
        let path = format!("/{}/{}", bucket, key);
        let req = RequestToSign {
            method,
            host: &self.cfg.endpoint,
            path: &path,
            query: Vec::new(),
            timestamp: Utc::now(),
        };
        let pairs = sigv4::presign_query(&self.credentials(), &req, expires.as_secs());
        format!("{}?{}", self.url_for(&path), canonical_query(&pairs))
    }
}
