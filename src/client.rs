//! Configuration Client
//!
//! HTTP client for the configuration API. A missing key maps to `None` so
//! callers can fall back to a default value.

use crate::tree::ConfigMap;
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::{debug, warn};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/config";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Client for one configuration server
#[derive(Debug, Clone)]
pub struct ConfigClient {
    base_url: String,
    http: reqwest::Client,
}

impl ConfigClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL with each segment appended and percent-encoded
    fn url(&self, segments: &[&str]) -> ClientResult<String> {
        let invalid = |reason: String| ClientError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    /// Value of a key, or `None` when the server reports it missing
    pub async fn get(&self, project: &str, environment: &str, key: &str) -> ClientResult<Option<String>> {
        let url = self.url(&[project, environment, key])?;
        let response = self.http.get(&url).send().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(%url, "Key not found");
            return Ok(None);
        }

        let body = read_success(&url, response).await?;
        Ok(Some(body))
    }

    /// Value of a key, or `default` when it is missing
    pub async fn get_or(
        &self,
        project: &str,
        environment: &str,
        key: &str,
        default: &str,
    ) -> ClientResult<String> {
        match self.get(project, environment, key).await? {
            Some(value) => Ok(value),
            None => {
                warn!(key, default, "Key not found, returning default value");
                Ok(default.to_string())
            }
        }
    }

    /// Create or overwrite a key
    pub async fn set(&self, project: &str, environment: &str, key: &str, value: &str) -> ClientResult<()> {
        let url = self.url(&[project, environment, key])?;
        let response = self
            .http
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(value.to_string())
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.clone(),
                source,
            })?;

        read_success(&url, response).await?;
        debug!(%url, "Configuration updated");
        Ok(())
    }

    /// Every key of an environment
    pub async fn get_environment(&self, project: &str, environment: &str) -> ClientResult<ConfigMap> {
        let url = self.url(&[project, environment])?;
        let response = self.http.get(&url).send().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { url, status, body });
        }

        response
            .json::<ConfigMap>()
            .await
            .map_err(|source| ClientError::Http { url, source })
    }
}

impl Default for ConfigClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

async fn read_success(url: &str, response: reqwest::Response) -> ClientResult<String> {
    let status = response.status();
    let body = response.text().await.map_err(|source| ClientError::Http {
        url: url.to_string(),
        source,
    })?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::Status {
            url: url.to_string(),
            status,
            body,
        })
    }
}
