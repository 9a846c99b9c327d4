use super::{CatalogEntry, ServiceError};
use crate::db::CatalogRepository;
use std::sync::Arc;

/// Read side of the catalog. The repository hands back creation order; this
/// service owns the presentation contract of most-recently-created first.
pub struct CatalogQueryService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogQueryService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// All published entries, newest first. No server-side filtering; search
    /// is the client's concern.
    pub async fn list_all(&self) -> Result<Vec<CatalogEntry>, ServiceError> {
        let mut entries = self.catalog.list_all().await?;
        entries.reverse();
        Ok(entries)
    }
}
