//! OpenAI image generation adapter.
//!
//! Calls `POST /v1/images/generations` with DALL-E 3 at 1792x1024 (closest
//! to a 1200x627 LinkedIn card), then downloads the returned URL. The
//! download uses a separate client so the API key never leaves for the
//! image host.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{endpoint_url, OpenAiConfig};
use crate::error::CollaboratorError;
use crate::traits::ImageRenderer;

const ENDPOINT: &str = "POST /v1/images/generations";

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
    style: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
}

/// Live DALL-E client.
#[derive(Debug, Clone)]
pub struct OpenAiImageClient {
    http: reqwest::Client,
    download: reqwest::Client,
    url: String,
}

impl OpenAiImageClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, CollaboratorError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                        .map_err(|_| CollaboratorError::NotConfigured("openai api key"))?,
                );
                headers
            })
            .build()
            .map_err(CollaboratorError::transport("client_init"))?;
        let download = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CollaboratorError::transport("client_init"))?;

        Ok(Self {
            http,
            download,
            url: endpoint_url(&config.base_url, "v1/images/generations"),
        })
    }

    async fn fetch(&self, image_url: &str) -> Result<Vec<u8>, CollaboratorError> {
        let endpoint = "GET generated image";
        let resp = self
            .download
            .get(image_url)
            .send()
            .await
            .map_err(CollaboratorError::transport(endpoint))?;
        let resp = CollaboratorError::require_success(endpoint, resp).await?;
        let bytes = resp.bytes().await.map_err(CollaboratorError::transport(endpoint))?;
        if bytes.is_empty() {
            return Err(CollaboratorError::malformed(endpoint, "empty image body"));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageRenderer for OpenAiImageClient {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, CollaboratorError> {
        let body = GenerationRequest {
            model: "dall-e-3",
            prompt,
            n: 1,
            size: "1792x1024",
            quality: "standard",
            style: "natural",
        };
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(CollaboratorError::transport(ENDPOINT))?;

        let resp = CollaboratorError::require_success(ENDPOINT, resp).await?;

        let generated: GenerationResponse =
            resp.json()
                .await
                .map_err(|e| CollaboratorError::Deserialization {
                    endpoint: ENDPOINT.into(),
                    source: e,
                })?;
        let url = generated
            .data
            .into_iter()
            .find_map(|img| img.url)
            .ok_or_else(|| CollaboratorError::malformed(ENDPOINT, "no image url in reply"))?;

        self.fetch(&url).await
    }

    fn adapter_name(&self) -> &str {
        "OpenAiImageClient"
    }
}
