//! Job search API client
//!
//! One POST per run with a fixed query; the response is returned untouched
//! as JSON. A saved response can be replayed from disk instead.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::FetchConfig;

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// Errors while retrieving the raw document
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid fetch configuration: {0}")]
    Config(#[from] jobfeed_common::JobfeedError),
}

/// Longest error body kept in [`FetchError::Status`]
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    keywords: &'a str,
    location: &'a str,
    count: u32,
}

/// HTTP client for the job search API
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Create new fetcher with configuration
    pub fn new(config: FetchConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("jobfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Issue the search request and return the raw response document
    pub async fn fetch(&self) -> Result<Value> {
        info!(
            url = %self.config.api_url,
            keywords = %self.config.keywords,
            location = %self.config.location,
            count = self.config.count,
            "Requesting job listings"
        );

        let query = SearchQuery {
            keywords: &self.config.keywords,
            location: &self.config.location,
            count: self.config.count,
        };

        let mut request = self
            .client
            .post(&self.config.api_url)
            .header("x-rapidapi-host", &self.config.api_host)
            .json(&query);

        if let Some(key) = &self.config.api_key {
            request = request.header("x-rapidapi-key", key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        info!(bytes = bytes.len(), "Received API response");

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Read a previously saved raw document
pub async fn read_document(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    info!("Loading raw document from {}", path.display());

    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Save a raw document for later replay
pub async fn save_document(document: &Value, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    tokio::fs::write(path, serde_json::to_vec_pretty(document)?).await?;
    info!("Raw document saved to {}", path.display());
    Ok(())
}
