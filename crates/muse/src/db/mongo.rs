use super::{validate_new_entry, CatalogRepository, RepositoryError};
use crate::services::{CatalogEntry, NewEntry};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

const COLLECTION: &str = "posts";

/// Wire format of a catalog entry in the document store
#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    prompt: String,
    image_url: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<&CatalogEntry> for PostDocument {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            prompt: entry.prompt.clone(),
            image_url: entry.image_url.clone(),
            created_at: entry.created_at,
        }
    }
}

impl From<PostDocument> for CatalogEntry {
    fn from(doc: PostDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            prompt: doc.prompt,
            image_url: doc.image_url,
            created_at: doc.created_at,
        }
    }
}

/// MongoDB-backed catalog repository
pub struct MongoCatalog {
    posts: Collection<PostDocument>,
}

impl MongoCatalog {
    /// Connect to the document store and bind the posts collection
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;
        let posts = client.database(database).collection::<PostDocument>(COLLECTION);
        Ok(Self { posts })
    }
}

#[async_trait::async_trait]
impl CatalogRepository for MongoCatalog {
    async fn create(&self, entry: NewEntry) -> Result<CatalogEntry, RepositoryError> {
        validate_new_entry(&entry)?;

        let entry = CatalogEntry::from_new(entry);
        self.posts
            .insert_one(PostDocument::from(&entry))
            .await
            .map_err(|e| RepositoryError::Unavailable(anyhow::Error::new(e)))?;

        tracing::info!(id = %entry.id, "Catalog entry created");
        Ok(entry)
    }

    async fn list_all(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        let cursor = self
            .posts
            .find(doc! {})
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(|e| RepositoryError::Unavailable(anyhow::Error::new(e)))?;

        let documents: Vec<PostDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| RepositoryError::Unavailable(anyhow::Error::new(e)))?;

        Ok(documents.into_iter().map(CatalogEntry::from).collect())
    }
}
