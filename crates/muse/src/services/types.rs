use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published gallery entry: a prompt, the display name of whoever
/// submitted it, and the durable URL of the generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub prompt: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl CatalogEntry {
    /// Generate a new 10-character ID using reduced alphabet
    pub fn generate_id() -> String {
        const ALPHABET: &[char] = &[
            '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j',
            'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
        ];
        nanoid::nanoid!(10, ALPHABET)
    }

    /// Materialize a catalog entry from a creation payload, assigning the id
    /// and creation timestamp.
    pub fn from_new(entry: NewEntry) -> Self {
        Self {
            id: Self::generate_id(),
            name: entry.name,
            prompt: entry.prompt,
            image_url: entry.image_url,
            created_at: Utc::now(),
        }
    }
}

/// Creation payload for a catalog entry. The id is assigned by the
/// repository, never by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    pub prompt: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}
