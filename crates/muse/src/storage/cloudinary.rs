use super::{ArtifactStore, StorageError};
use crate::services::StorageConfig;
use anyhow::Result;
use base64::prelude::{Engine, BASE64_STANDARD};
use chrono::Utc;
use reqwest::multipart::Form;
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Cloudinary-backed artifact store. Every upload lands under one fixed
/// folder so the whole gallery is discoverable under a single namespace.
pub struct CloudinaryStore {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
    client: reqwest::Client,
}

impl CloudinaryStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if config.cloud_name.is_empty() || config.api_key.is_empty() || config.api_secret.is_empty()
        {
            return Err(anyhow::anyhow!(
                "Cloudinary credentials (cloud name, api key, api secret) are required"
            ));
        }

        Ok(Self {
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
            client: reqwest::Client::new(),
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }

    /// SHA-256 signature over the alphabetically sorted upload parameters
    /// with the API secret appended
    fn sign(&self, timestamp: &str) -> String {
        let to_sign = format!(
            "folder={}&timestamp={}{}",
            self.folder, timestamp, self.api_secret
        );
        format!("{:x}", Sha256::digest(to_sign.as_bytes()))
    }
}

#[async_trait::async_trait]
impl ArtifactStore for CloudinaryStore {
    async fn upload(&self, image: &[u8]) -> Result<String, StorageError> {
        if image.is_empty() {
            return Err(StorageError::InvalidPayload("empty image payload".into()));
        }

        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&timestamp);
        let data_uri = format!("data:image/png;base64,{}", BASE64_STANDARD.encode(image));

        let form = Form::new()
            .text("file", data_uri)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature", signature);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "Artifact upload failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED => StorageError::InvalidCredentials(body),
                StatusCode::BAD_REQUEST => StorageError::InvalidPayload(body),
                _ => StorageError::UploadFailed(format!("{}: {}", status, body)),
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("unreadable response: {}", e)))?;

        if uploaded.secure_url.is_empty() {
            return Err(StorageError::UploadFailed(
                "storage returned no artifact URL".into(),
            ));
        }

        tracing::info!(url = %uploaded.secure_url, "Artifact uploaded");
        Ok(uploaded.secure_url)
    }
}
