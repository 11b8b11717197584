//! Object storage access for source documents

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, Result};

/// Trait for fetching raw document bytes by URL
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download the object at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Store name for logging
    fn name(&self) -> &str;
}

/// Bucket and key parsed from a virtual-hosted S3 URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

/// Parse a virtual-hosted-style S3 URL into bucket and key.
///
/// Accepts `https://<bucket>.s3.<region>.amazonaws.com/<key>`.
pub fn parse_s3_url(url: &str) -> Result<S3Location> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^https://([^.]+)\.s3\.[^.]+\.amazonaws\.com/(.+)$")
            .expect("static S3 URL pattern compiles")
    });

    let captures = pattern
        .captures(url)
        .ok_or_else(|| Error::Download(format!("invalid S3 URL format: {}", url)))?;

    Ok(S3Location {
        bucket: captures[1].to_string(),
        key: captures[2].to_string(),
    })
}

/// Fetches objects over plain HTTP GET (presigned or public URLs)
pub struct HttpObjectStore {
    client: reqwest::Client,
}

impl HttpObjectStore {
    /// Create a store with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Download(format!("failed to build http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Download(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "fetch returned {} for {}",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Download(format!("body read failed: {}", e)))?;

        tracing::debug!(url, bytes = bytes.len(), "fetched object");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_url() {
        let location =
            parse_s3_url("https://course-docs.s3.us-east-1.amazonaws.com/uploads/week1.pdf")
                .unwrap();
        assert_eq!(location.bucket, "course-docs");
        assert_eq!(location.key, "uploads/week1.pdf");
    }

    #[test]
    fn test_parse_s3_url_rejects_other_hosts() {
        assert!(parse_s3_url("https://example.com/file.pdf").is_err());
        assert!(parse_s3_url("https://bucket.storage.googleapis.com/file.pdf").is_err());
        assert!(parse_s3_url("not a url").is_err());
    }

    #[test]
    fn test_parse_s3_url_keeps_nested_keys() {
        let location =
            parse_s3_url("https://b.s3.eu-west-2.amazonaws.com/a/b/c/d.pdf").unwrap();
        assert_eq!(location.key, "a/b/c/d.pdf");
    }
}
