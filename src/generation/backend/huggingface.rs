//! POST-style backend for the HuggingFace inference API

use super::{check_status, GenerationBackend, GenerationRequest};
use crate::error::{Result, StickerError};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_API_URL: &str =
    "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-schnell";
const DEFAULT_TIMEOUT_MS: u64 = 60000;

/// Environment variable holding the bearer credential
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// Backend for services that take a JSON body and a bearer token.
/// A 503 from the service means the model is still loading and is worth
/// retrying; any other non-200 is a hard failure.
pub struct HuggingFaceBackend {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    seed: u64,
    width: u32,
    height: u32,
}

impl HuggingFaceBackend {
    /// Read the credential from `HF_TOKEN`
    pub fn from_env() -> Result<Self> {
        Self::from_token(std::env::var(TOKEN_ENV).ok())
    }

    /// Build from an optional credential, rejecting absent or blank tokens
    pub fn from_token(token: Option<String>) -> Result<Self> {
        let token = token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
            StickerError::MissingCredential(format!("{TOKEN_ENV} is not set"))
        })?;
        Ok(Self::with_options(
            DEFAULT_API_URL,
            token,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        ))
    }

    pub fn with_options(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl GenerationBackend for HuggingFaceBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        let body = InferenceRequest {
            inputs: &request.prompt,
            parameters: InferenceParameters {
                seed: request.seed,
                width: request.width,
                height: request.height,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
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
        "huggingface"
    }
}
