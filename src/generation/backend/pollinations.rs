//! GET-style templated backend: prompt in the path, parameters in the query

use super::{check_status, GenerationBackend, GenerationRequest};
use crate::error::{Result, StickerError};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://image.pollinations.ai";
const DEFAULT_TIMEOUT_MS: u64 = 60000;

/// Backend for services that template the whole request into a GET URL
pub struct PollinationsBackend {
    client: reqwest::Client,
    base_url: String,
}

impl PollinationsBackend {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_BASE_URL, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    pub fn with_options(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Build the templated request URL; the prompt is escaped into the path
    fn build_url(&self, request: &GenerationRequest) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| StickerError::Generation(format!("invalid base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StickerError::Generation("base url cannot carry a path".to_string()))?
            .push("prompt")
            .push(&request.prompt);
        url.query_pairs_mut()
            .append_pair("seed", &request.seed.to_string())
            .append_pair("width", &request.width.to_string())
            .append_pair("height", &request.height.to_string())
            .append_pair("nologo", "true");
        Ok(url)
    }
}

impl Default for PollinationsBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for PollinationsBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        let url = self.build_url(request)?;
        tracing::debug!(url = %url, "dispatching generation request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StickerError::Network(e.to_string()))?;

        check_status(self.name(), response.status())?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StickerError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "pollinations"
    }
}
