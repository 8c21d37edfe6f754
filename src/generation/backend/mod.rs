// Generation service backends

mod huggingface;
mod pollinations;

pub use huggingface::HuggingFaceBackend;
pub use pollinations::PollinationsBackend;

use crate::error::{Result, StickerError};
use async_trait::async_trait;
use reqwest::StatusCode;

/// One image-from-text request as the backends see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
}

/// Base trait for stateless image-from-text providers.
///
/// A backend performs exactly one network round trip per call and never
/// retries on its own; retry policy belongs to the orchestrator.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Request one image; returns the encoded image bytes on success
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<u8>>;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Map an HTTP status to the shared failure classes: 503 means the service
/// is warming up (retryable upstream), any other non-success is a hard failure
pub(crate) fn check_status(name: &str, status: StatusCode) -> Result<()> {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(StickerError::ServiceUnavailable(format!(
            "{name} is warming up (503)"
        )));
    }
    if !status.is_success() {
        return Err(StickerError::Generation(format!(
            "{name} request failed with status {status}"
        )));
    }
    Ok(())
}
