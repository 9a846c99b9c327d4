use super::{CatalogEntry, NewEntry, ServiceError};
use crate::db::CatalogRepository;
use crate::generation::GenerationClient;
use crate::storage::ArtifactStore;
use std::sync::Arc;

/// Orchestrates the generate -> upload -> persist pipeline for a single
/// prompt. Collaborator failures stop the pipeline and are passed through
/// undecorated; no stage is retried, nothing partial is persisted.
pub struct PublishingService {
    generator: Arc<dyn GenerationClient>,
    store: Arc<dyn ArtifactStore>,
    catalog: Arc<dyn CatalogRepository>,
}

impl PublishingService {
    pub fn new(
        generator: Arc<dyn GenerationClient>,
        store: Arc<dyn ArtifactStore>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            generator,
            store,
            catalog,
        }
    }

    /// Generate an image for a prompt, returning its raw bytes. The bytes
    /// exist only in memory until they are uploaded or discarded.
    pub async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ServiceError> {
        if prompt.is_empty() {
            return Err(ServiceError::Validation(
                "Please provide a prompt".to_string(),
            ));
        }

        tracing::info!(model = %self.generator.model_id(), "Generating image");
        let bytes = self.generator.generate(prompt).await?;
        Ok(bytes)
    }

    /// Upload an already generated image and record the catalog entry.
    /// Upload failure means the catalog is never touched; persist failure
    /// leaves the uploaded artifact orphaned, which is logged rather than
    /// compensated.
    pub async fn publish(
        &self,
        name: &str,
        prompt: &str,
        image: &[u8],
    ) -> Result<CatalogEntry, ServiceError> {
        if name.is_empty() || prompt.is_empty() {
            return Err(ServiceError::Validation(
                "Please provide name and prompt".to_string(),
            ));
        }
        if image.is_empty() {
            return Err(ServiceError::Validation(
                "Please provide an image".to_string(),
            ));
        }

        tracing::info!(name, "Uploading artifact");
        let image_url = self.store.upload(image).await?;

        tracing::info!(name, %image_url, "Persisting catalog entry");
        let created = self
            .catalog
            .create(NewEntry {
                name: name.to_string(),
                prompt: prompt.to_string(),
                image_url: image_url.clone(),
            })
            .await;

        match created {
            Ok(entry) => Ok(entry),
            Err(e) => {
                // Known gap: the artifact stays in storage with no catalog
                // entry pointing at it
                tracing::warn!(%image_url, "Catalog persist failed after upload; artifact orphaned");
                Err(e.into())
            },
        }
    }

    /// Full pipeline for one prompt: generate, upload, persist. Validation
    /// happens before the first stage runs.
    pub async fn generate_and_publish(
        &self,
        name: &str,
        prompt: &str,
    ) -> Result<CatalogEntry, ServiceError> {
        if name.is_empty() || prompt.is_empty() {
            return Err(ServiceError::Validation(
                "Please provide name and prompt".to_string(),
            ));
        }

        let image = self.generate(prompt).await?;
        self.publish(name, prompt, &image).await
    }
}
