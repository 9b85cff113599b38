//! Client for the video processing service: direct uploads, asset
//! state, caption transcripts, and the CDN URLs for derived images.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::MediaError;

/// A freshly created direct upload: the correlation id we store on the
/// video row and the URL the client PUTs the file to.
#[derive(Debug, Clone)]
pub struct DirectUpload {
    pub upload_id: String,
    pub upload_url: String,
}

/// The processor's view of an upload. `asset_id` appears once the
/// processor has ingested the file.
#[derive(Debug, Clone)]
pub struct UploadInfo {
    pub asset_id: Option<String>,
}

/// The processor's view of an asset.
#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub status: String,
    pub playback_id: Option<String>,
    pub duration_ms: i32,
}

/// The video processing service.
#[async_trait]
pub trait VideoProcessor: Send + Sync {
    /// Ask the processor for a direct-upload slot.
    async fn create_direct_upload(&self) -> Result<DirectUpload, MediaError>;

    /// Current state of an upload.
    async fn get_upload(&self, upload_id: &str) -> Result<UploadInfo, MediaError>;

    /// Current state of an asset.
    async fn get_asset(&self, asset_id: &str) -> Result<AssetInfo, MediaError>;

    /// Delete the asset on the processor side.
    async fn delete_asset(&self, asset_id: &str) -> Result<(), MediaError>;

    /// Plain-text transcript of a caption track.
    async fn fetch_transcript(
        &self,
        playback_id: &str,
        track_id: &str,
    ) -> Result<String, MediaError>;

    /// CDN URL of the still frame the processor derives for an asset.
    fn thumbnail_url(&self, playback_id: &str) -> String;

    /// CDN URL of the animated preview.
    fn preview_url(&self, playback_id: &str) -> String;
}

/// HTTP implementation against the processor's REST API.
pub struct HttpVideoProcessor {
    client: reqwest::Client,
    api_url: String,
    image_cdn_url: String,
    stream_cdn_url: String,
    token: String,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct UploadBody {
    id: String,
    url: String,
    asset_id: Option<String>,
}

#[derive(Deserialize)]
struct AssetBody {
    status: String,
    playback_ids: Option<Vec<PlaybackId>>,
    /// Seconds, fractional.
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct PlaybackId {
    id: String,
}

impl HttpVideoProcessor {
    pub fn new(
        client: reqwest::Client,
        api_url: String,
        image_cdn_url: String,
        stream_cdn_url: String,
        token: String,
    ) -> Self {
        Self {
            client,
            api_url,
            image_cdn_url,
            stream_cdn_url,
            token,
        }
    }
}

#[async_trait]
impl VideoProcessor for HttpVideoProcessor {
    async fn create_direct_upload(&self) -> Result<DirectUpload, MediaError> {
        let response = self
            .client
            .post(format!("{}/v1/uploads", self.api_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "new_asset_settings": { "playback_policy": ["public"] } }))
            .send()
            .await?;
        let body: Envelope<UploadBody> = MediaError::check(response).await?.json().await?;
        Ok(DirectUpload {
            upload_id: body.data.id,
            upload_url: body.data.url,
        })
    }

    async fn get_upload(&self, upload_id: &str) -> Result<UploadInfo, MediaError> {
        let response = self
            .client
            .get(format!("{}/v1/uploads/{upload_id}", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body: Envelope<UploadBody> = MediaError::check(response).await?.json().await?;
        Ok(UploadInfo {
            asset_id: body.data.asset_id,
        })
    }

    async fn get_asset(&self, asset_id: &str) -> Result<AssetInfo, MediaError> {
        let response = self
            .client
            .get(format!("{}/v1/assets/{asset_id}", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body: Envelope<AssetBody> = MediaError::check(response).await?.json().await?;
        Ok(AssetInfo {
            status: body.data.status,
            playback_id: body
                .data
                .playback_ids
                .and_then(|ids| ids.into_iter().next())
                .map(|p| p.id),
            duration_ms: seconds_to_ms(body.data.duration),
        })
    }

    async fn delete_asset(&self, asset_id: &str) -> Result<(), MediaError> {
        let response = self
            .client
            .delete(format!("{}/v1/assets/{asset_id}", self.api_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        MediaError::check(response).await?;
        Ok(())
    }

    async fn fetch_transcript(
        &self,
        playback_id: &str,
        track_id: &str,
    ) -> Result<String, MediaError> {
        let response = self
            .client
            .get(format!(
                "{}/{playback_id}/text/{track_id}.txt",
                self.stream_cdn_url
            ))
            .send()
            .await?;
        Ok(MediaError::check(response).await?.text().await?)
    }

    fn thumbnail_url(&self, playback_id: &str) -> String {
        format!("{}/{playback_id}/thumbnail.jpg", self.image_cdn_url)
    }

    fn preview_url(&self, playback_id: &str) -> String {
        format!("{}/{playback_id}/animated.gif", self.image_cdn_url)
    }
}

/// Processor reports fractional seconds; rows store whole ms.
pub fn seconds_to_ms(seconds: Option<f64>) -> i32 {
    seconds.map(|s| (s * 1000.0).round() as i32).unwrap_or(0)
}
