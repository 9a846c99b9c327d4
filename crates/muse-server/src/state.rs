use anyhow::Result;
use muse::db::mongo::MongoCatalog;
use muse::db::CatalogRepository;
use muse::generation::{self, GenerationClient};
use muse::services::{CatalogQueryService, ProjectConfig, PublishingService};
use muse::storage::{self, ArtifactStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub publishing: Arc<PublishingService>,
    pub query: Arc<CatalogQueryService>,
}

impl AppState {
    /// Build the service handles once at startup. Missing configuration is
    /// fatal here; requests never see a half-configured state.
    pub async fn from_env() -> Result<Self> {
        let config = ProjectConfig::from_env()?;
        config.validate()?;

        let generator = generation::create_client(&config.generation)?;
        let store = storage::create_store(&config.storage)?;
        let catalog: Arc<dyn CatalogRepository> = Arc::new(
            MongoCatalog::connect(&config.catalog.uri, &config.catalog.database).await?,
        );

        Ok(Self::assemble(generator, store, catalog))
    }

    /// Wire services from explicit collaborators; tests substitute fakes here
    pub fn assemble(
        generator: Arc<dyn GenerationClient>,
        store: Arc<dyn ArtifactStore>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        let publishing = Arc::new(PublishingService::new(generator, store, catalog.clone()));
        let query = Arc::new(CatalogQueryService::new(catalog));
        Self { publishing, query }
    }
}
