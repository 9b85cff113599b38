//! Client for the text-generation API used by the metadata jobs.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::MediaError;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One chat completion: a fixed system prompt plus the user input.
    async fn complete(&self, system: &str, input: &str) -> Result<String, MediaError>;

    /// Generate an image from a prompt; returns the provider's
    /// (short-lived) image URL.
    async fn generate_image(&self, prompt: &str) -> Result<String, MediaError>;
}

/// HTTP implementation against a chat-completions style API.
pub struct HttpTextGenerator {
    client: reqwest::Client,
    api_url: String,
    token: String,
    model: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: String,
}

impl HttpTextGenerator {
    pub fn new(client: reqwest::Client, api_url: String, token: String, model: String) -> Self {
        Self {
            client,
            api_url,
            token,
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn complete(&self, system: &str, input: &str) -> Result<String, MediaError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": input },
            ],
        });
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let body: CompletionResponse = MediaError::check(response).await?.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| MediaError::Malformed("completion with no choices".into()))
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, MediaError> {
        let body = serde_json::json!({
            "prompt": prompt,
            "n": 1,
            "size": "1792x1024",
        });
        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.api_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let body: ImageResponse = MediaError::check(response).await?.json().await?;
        body.data
            .into_iter()
            .next()
            .map(|d| d.url)
            .ok_or_else(|| MediaError::Malformed("image response with no data".into()))
    }
}
