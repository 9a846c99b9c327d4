pub mod config;
pub mod publish;
pub mod query;
pub mod types;

pub use config::{CatalogConfig, GenerationConfig, ProjectConfig, StorageConfig};
pub use publish::PublishingService;
pub use query::CatalogQueryService;
pub use types::{CatalogEntry, NewEntry};

use crate::db::RepositoryError;
use crate::generation::GenerationError;
use crate::storage::StorageError;

/// Failures surfaced by the publishing and query services. Each collaborator
/// classifies its own failures; the services pass them through undecorated.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
