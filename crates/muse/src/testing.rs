//! Test doubles for the muse crate
//!
//! Hand-rolled fakes for the three collaborator traits, each with a
//! failure-injection constructor so pipeline atomicity can be exercised
//! without any network or database.

use crate::db::{validate_new_entry, CatalogRepository, RepositoryError};
use crate::generation::{GenerationClient, GenerationError};
use crate::services::{CatalogEntry, NewEntry};
use crate::storage::{ArtifactStore, StorageError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Generation client returning fixed bytes, or a configured failure
pub struct TestGenerator {
    bytes: Vec<u8>,
    failure: Option<fn() -> GenerationError>,
    pub calls: AtomicUsize,
}

impl TestGenerator {
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(failure: fn() -> GenerationError) -> Self {
        Self {
            bytes: Vec::new(),
            failure: Some(failure),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl GenerationClient for TestGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Vec<u8>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(make) => Err(make()),
            None => Ok(self.bytes.clone()),
        }
    }

    fn model_id(&self) -> &str {
        "test-image-model"
    }
}

/// Artifact store recording every upload, or failing on demand
pub struct TestStore {
    url: String,
    fail: bool,
    pub uploads: Mutex<Vec<Vec<u8>>>,
}

impl TestStore {
    pub fn returning(url: &str) -> Self {
        Self {
            url: url.to_string(),
            fail: false,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: String::new(),
            fail: true,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ArtifactStore for TestStore {
    async fn upload(&self, image: &[u8]) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::UploadFailed("injected failure".into()));
        }
        self.uploads.lock().unwrap().push(image.to_vec());
        Ok(self.url.clone())
    }
}

/// In-memory catalog repository, thread-safe via Mutex. Preserves insertion
/// order so ordering contracts can be tested.
pub struct TestCatalog {
    entries: Mutex<Vec<CatalogEntry>>,
    fail: bool,
    pub create_calls: AtomicUsize,
}

impl TestCatalog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: false,
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: true,
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CatalogRepository for TestCatalog {
    async fn create(&self, entry: NewEntry) -> Result<CatalogEntry, RepositoryError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RepositoryError::Unavailable(anyhow::anyhow!(
                "injected failure"
            )));
        }
        validate_new_entry(&entry)?;
        let entry = CatalogEntry::from_new(entry);
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list_all(&self) -> Result<Vec<CatalogEntry>, RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Unavailable(anyhow::anyhow!(
                "injected failure"
            )));
        }
        Ok(self.entries.lock().unwrap().clone())
    }
}
