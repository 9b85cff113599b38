//! Client for the blob store that hosts thumbnails, previews, and
//! banners. Images fetched from third-party CDNs are re-hosted here so
//! rows never reference storage we do not control.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MediaError;

/// A hosted object: the stable public URL plus the key used to delete
/// it later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Pull `source_url` server-side and host a copy.
    async fn upload_from_url(&self, source_url: &str) -> Result<StoredFile, MediaError>;

    /// Delete a hosted object. Unknown keys are a no-op.
    async fn delete(&self, key: &str) -> Result<(), MediaError>;
}

/// HTTP implementation against the upload service's server API.
pub struct HttpImageHost {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    key: String,
    url: String,
}

impl HttpImageHost {
    pub fn new(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self {
            client,
            api_url,
            token,
        }
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload_from_url(&self, source_url: &str) -> Result<StoredFile, MediaError> {
        let response = self
            .client
            .post(format!("{}/v1/uploadFromUrl", self.api_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "url": source_url }))
            .send()
            .await?;
        let body: UploadResponse = MediaError::check(response).await?.json().await?;
        Ok(StoredFile {
            key: body.key,
            url: body.url,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), MediaError> {
        let response = self
            .client
            .post(format!("{}/v1/deleteFiles", self.api_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "fileKeys": [key] }))
            .send()
            .await?;
        MediaError::check(response).await?;
        Ok(())
    }
}
