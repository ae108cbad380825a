//! Lesson API access: fetch the lesson catalogue and download asset PDFs.
//!
//! Both requests carry the same bearer token. The catalogue must be a JSON
//! array; anything else aborts the import. Each element is decoded on its
//! own, and asset downloads fail one asset at a time.

use crate::config::ImportConfig;
use crate::error::{AssetError, PipelineError};
use crate::output::CatalogueEntry;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

/// Where lessons and their asset bytes come from.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// The full lesson catalogue, in API order.
    async fn list_lessons(&self) -> Result<Vec<CatalogueEntry>, PipelineError>;

    /// Download one asset's PDF bytes.
    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// [`AssetSource`] talking to the Oak lesson API over HTTPS.
#[derive(Debug, Clone)]
pub struct OakApiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OakApiClient {
    pub fn new(config: &ImportConfig) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response, AssetError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| AssetError::Transport(transport_reason(&e)))?;

        if response.status() != StatusCode::OK {
            return Err(AssetError::Status {
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

fn transport_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    }
}

#[async_trait]
impl AssetSource for OakApiClient {
    async fn list_lessons(&self) -> Result<Vec<CatalogueEntry>, PipelineError> {
        info!("Fetching lesson catalogue from {}", self.api_url);

        let response = self
            .get(&self.api_url, "application/json")
            .await
            .map_err(|e| PipelineError::CatalogueFailed(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::CatalogueFailed(transport_reason(&e)))?;

        parse_catalogue(&body)
    }

    async fn fetch_pdf(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self.get(url, "application/pdf").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AssetError::Transport(transport_reason(&e)))?;

        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Decode the catalogue body. It must be a JSON array; its elements are
/// decoded one by one.
pub fn parse_catalogue(body: &[u8]) -> Result<Vec<CatalogueEntry>, PipelineError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|_| PipelineError::CatalogueFailed("Failed to parse JSON response".to_string()))?;

    let serde_json::Value::Array(elements) = value else {
        return Err(PipelineError::CatalogueFailed(
            "Invalid response from Oak API".to_string(),
        ));
    };

    Ok(elements.into_iter().map(CatalogueEntry::from_value).collect())
}
