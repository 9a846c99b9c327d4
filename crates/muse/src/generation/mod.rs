pub mod openai;

pub use openai::OpenAiImageClient;

use crate::services::GenerationConfig;
use anyhow::Result;
use std::sync::Arc;

/// Trait for text-to-image generation clients
#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a single image for the prompt, returning its raw bytes.
    /// Exactly one outbound call; the caller decides whether to retry.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError>;

    /// Get the model identifier
    fn model_id(&self) -> &str;
}

/// Closed taxonomy of generation failures, in priority order of detection
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("image model credentials are not configured")]
    MissingCredentials,

    #[error("image model billing limit reached: {0}")]
    BillingExceeded(String),

    #[error("image model rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("image model rejected the credentials: {0}")]
    AuthenticationFailed(String),

    #[error("image model rejected the request: {0}")]
    InvalidRequest(String),

    #[error("image model unavailable: {message}")]
    Upstream {
        message: String,
        kind: Option<String>,
        code: Option<String>,
    },
}

impl GenerationError {
    pub(crate) fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            kind: None,
            code: None,
        }
    }
}

/// Create a generation client from configuration
pub fn create_client(config: &GenerationConfig) -> Result<Arc<dyn GenerationClient>> {
    let client = OpenAiImageClient::new(config)?;
    Ok(Arc::new(client))
}
