//! # LinkedIn REST Publisher
//!
//! Publishes through the versioned REST API. Media goes first: an
//! `initializeUpload` call returns an upload URL and a media URN, the
//! bytes are `PUT` to the URL, and the URN is attached to the post.
//!
//! The external post id is read from the `x-restli-id` header, else the
//! body's `id`, else the literal `"posted"`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::config::{endpoint_url, LinkedInConfig};
use crate::error::CollaboratorError;
use crate::traits::{
    AccountProfile, MediaKind, PublishMedia, PublishRequest, Publisher, PublisherCredentials,
};

const LINKEDIN_VERSION: &str = "202401";
const RESTLI_PROTOCOL: &str = "2.0.0";

/// Fallback id when the API acknowledges without returning one.
pub const UNKNOWN_POST_ID: &str = "posted";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeUploadResponse {
    value: UploadTicket,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadTicket {
    upload_url: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    document: Option<String>,
}

/// Live LinkedIn publisher.
#[derive(Debug, Clone)]
pub struct LinkedInPublisher {
    http: reqwest::Client,
    base_url: Url,
}

impl LinkedInPublisher {
    pub fn new(config: LinkedInConfig) -> Result<Self, CollaboratorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    "LinkedIn-Version",
                    reqwest::header::HeaderValue::from_static(LINKEDIN_VERSION),
                );
                headers.insert(
                    "X-Restli-Protocol-Version",
                    reqwest::header::HeaderValue::from_static(RESTLI_PROTOCOL),
                );
                headers
            })
            .build()
            .map_err(CollaboratorError::transport("client_init"))?;
        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Upload media and return its URN.
    async fn upload(
        &self,
        credentials: &PublisherCredentials,
        media: &PublishMedia,
    ) -> Result<String, CollaboratorError> {
        let collection = match media.kind {
            MediaKind::Image => "images",
            MediaKind::Document => "documents",
        };
        let endpoint = format!("POST /rest/{collection}?action=initializeUpload");
        let url = endpoint_url(
            &self.base_url,
            &format!("rest/{collection}?action=initializeUpload"),
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&json!({
                "initializeUploadRequest": { "owner": credentials.person_urn }
            }))
            .send()
            .await
            .map_err(CollaboratorError::transport(&endpoint))?;
        let resp = CollaboratorError::require_success(&endpoint, resp).await?;
        let ticket: InitializeUploadResponse =
            resp.json()
                .await
                .map_err(|e| CollaboratorError::Deserialization {
                    endpoint: endpoint.clone(),
                    source: e,
                })?;
        let urn = match media.kind {
            MediaKind::Image => ticket.value.image,
            MediaKind::Document => ticket.value.document,
        }
        .ok_or_else(|| CollaboratorError::malformed(&endpoint, "no media urn in upload ticket"))?;

        let put_endpoint = "PUT media upload";
        let resp = self
            .http
            .put(&ticket.value.upload_url)
            .bearer_auth(&credentials.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(media.bytes.clone())
            .send()
            .await
            .map_err(CollaboratorError::transport(put_endpoint))?;
        CollaboratorError::require_success(put_endpoint, resp).await?;

        tracing::debug!(urn = %urn, kind = ?media.kind, "media uploaded");
        Ok(urn)
    }
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    async fn publish(
        &self,
        credentials: &PublisherCredentials,
        request: &PublishRequest,
    ) -> Result<String, CollaboratorError> {
        let mut body = json!({
            "author": credentials.person_urn,
            "commentary": request.commentary,
            "visibility": "PUBLIC",
            "distribution": {
                "feedDistribution": "MAIN_FEED",
                "targetEntities": [],
                "thirdPartyDistributionChannels": []
            },
            "lifecycleState": "PUBLISHED",
            "isReshareDisabledByAuthor": false
        });

        if let Some(media) = &request.media {
            let urn = self.upload(credentials, media).await?;
            body["content"] = match media.kind {
                MediaKind::Image => json!({ "media": { "id": urn } }),
                MediaKind::Document => json!({ "media": { "id": urn, "title": request.title } }),
            };
        }

        let endpoint = "POST /rest/posts";
        let resp = self
            .http
            .post(endpoint_url(&self.base_url, "rest/posts"))
            .bearer_auth(&credentials.access_token)
            .json(&body)
            .send()
            .await
            .map_err(CollaboratorError::transport(endpoint))?;
        let resp = CollaboratorError::require_success(endpoint, resp).await?;

        if let Some(id) = resp
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
        {
            return Ok(id.to_string());
        }
        let text = resp.text().await.unwrap_or_default();
        let id = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_POST_ID.to_string());
        Ok(id)
    }

    async fn verify(&self, credentials: &PublisherCredentials) -> Result<AccountProfile, CollaboratorError> {
        let endpoint = "GET /v2/userinfo";
        let resp = self
            .http
            .get(endpoint_url(&self.base_url, "v2/userinfo"))
            .bearer_auth(&credentials.access_token)
            .send()
            .await
            .map_err(CollaboratorError::transport(endpoint))?;
        let resp = CollaboratorError::require_success(endpoint, resp).await?;
        resp.json()
            .await
            .map_err(|e| CollaboratorError::Deserialization {
                endpoint: endpoint.to_string(),
                source: e,
            })
    }

    fn adapter_name(&self) -> &str {
        "LinkedInPublisher"
    }
}
