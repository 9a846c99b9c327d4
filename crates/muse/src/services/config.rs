use anyhow::{Context, Result};
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Configuration for the image generation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "dall-e-2".to_string(),
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Configuration for the object storage backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Single namespace every uploaded artifact lands under
    pub folder: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: "muse_gallery".to_string(),
        }
    }
}

/// Configuration for the catalog document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub uri: String,
    pub database: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            database: "muse".to_string(),
        }
    }
}

/// Project configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl ProjectConfig {
    /// Load configuration from the environment (MUSE_ prefix, __ separator)
    pub fn from_env() -> Result<Self> {
        Figment::new()
            .merge(Serialized::defaults(ProjectConfig::default()))
            .merge(Env::prefixed("MUSE_").split("__"))
            .extract()
            .context("Failed to load configuration")
    }

    /// Verify every required credential is present. Missing configuration is
    /// a fatal startup error, never a per-request error.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.generation.api_key.is_empty() {
            missing.push("MUSE_GENERATION__API_KEY");
        }
        if self.storage.cloud_name.is_empty() {
            missing.push("MUSE_STORAGE__CLOUD_NAME");
        }
        if self.storage.api_key.is_empty() {
            missing.push("MUSE_STORAGE__API_KEY");
        }
        if self.storage.api_secret.is_empty() {
            missing.push("MUSE_STORAGE__API_SECRET");
        }
        if self.catalog.uri.is_empty() {
            missing.push("MUSE_CATALOG__URI");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Missing required configuration: {}",
                missing.join(", ")
            ))
        }
    }
}
