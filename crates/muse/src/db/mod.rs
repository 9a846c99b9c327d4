pub mod mongo;

use crate::services::{CatalogEntry, NewEntry};

/// Repository trait for the published-entry catalog
#[async_trait::async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Persist a new entry, assigning its id. Rejects payloads with any
    /// empty field before touching the store.
    async fn create(&self, entry: NewEntry) -> Result<CatalogEntry, RepositoryError>;

    /// All entries in creation order. Presentation order (newest first) is
    /// the query service's concern, not the repository's.
    async fn list_all(&self) -> Result<Vec<CatalogEntry>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("invalid catalog entry: {0}")]
    Validation(String),

    #[error("catalog store unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

/// Shared creation-payload validation every repository implementation runs
/// before writing. A persisted entry never has an empty field.
pub fn validate_new_entry(entry: &NewEntry) -> Result<(), RepositoryError> {
    if entry.name.is_empty() {
        return Err(RepositoryError::Validation("name must not be empty".into()));
    }
    if entry.prompt.is_empty() {
        return Err(RepositoryError::Validation(
            "prompt must not be empty".into(),
        ));
    }
    if entry.image_url.is_empty() {
        return Err(RepositoryError::Validation(
            "imageUrl must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewEntry {
        NewEntry {
            name: "Ada".to_string(),
            prompt: "a fox in the snow".to_string(),
            image_url: "https://cdn.example.com/muse_gallery/fox.png".to_string(),
        }
    }

    #[test]
    fn accepts_fully_populated_entry() {
        assert!(validate_new_entry(&valid()).is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let entry = NewEntry {
            name: String::new(),
            ..valid()
        };
        assert!(matches!(
            validate_new_entry(&entry),
            Err(RepositoryError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_prompt() {
        let entry = NewEntry {
            prompt: String::new(),
            ..valid()
        };
        assert!(matches!(
            validate_new_entry(&entry),
            Err(RepositoryError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_image_url() {
        let entry = NewEntry {
            image_url: String::new(),
            ..valid()
        };
        assert!(matches!(
            validate_new_entry(&entry),
            Err(RepositoryError::Validation(_))
        ));
    }
}
