pub mod cloudinary;

pub use cloudinary::CloudinaryStore;

use crate::services::StorageConfig;
use anyhow::Result;
use std::sync::Arc;

/// Trait for durable object storage of generated images
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload raw image bytes, returning a stable public URL. The catalog
    /// must never reference an artifact this call did not confirm.
    async fn upload(&self, image: &[u8]) -> Result<String, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object storage rejected the credentials: {0}")]
    InvalidCredentials(String),

    #[error("object storage rejected the payload: {0}")]
    InvalidPayload(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// Create an artifact store from configuration
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ArtifactStore>> {
    let store = CloudinaryStore::new(config)?;
    Ok(Arc::new(store))
}
