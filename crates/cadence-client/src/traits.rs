//! # Collaborator Traits
//!
//! One trait per external judgment or side effect. Implementations must be
//! `Send + Sync` so they can be shared behind an `Arc`; every trait is
//! object-safe so live and mock adapters are interchangeable at runtime.
//!
//! Replies are returned raw. Validation against the taxonomy, permutation
//! checks and fallbacks belong to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cadence_core::{ContentType, PostId};

use crate::error::CollaboratorError;

/// A post as the narrative orderer sees it: id and title only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitledPost {
    pub id: PostId,
    pub title: String,
}

/// Input to tag selection.
#[derive(Debug, Clone, Copy)]
pub struct TagRequest<'a> {
    pub content_type: ContentType,
    pub title: &'a str,
    /// Full body; adapters excerpt it.
    pub body: &'a str,
    /// The taxonomy subset the selector may choose from.
    pub candidates: &'a [&'static str],
}

/// Input to image prompt writing.
#[derive(Debug, Clone, Copy)]
pub struct ImagePromptRequest<'a> {
    pub content_type: ContentType,
    pub title: &'a str,
    pub body: &'a str,
}

/// Publisher account credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct PublisherCredentials {
    pub access_token: String,
    /// Author URN, e.g. `urn:li:person:abc123`.
    pub person_urn: String,
}

impl std::fmt::Debug for PublisherCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublisherCredentials")
            .field("access_token", &"[REDACTED]")
            .field("person_urn", &self.person_urn)
            .finish()
    }
}

/// The account a set of publisher credentials belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    #[serde(default)]
    pub name: Option<String>,
    /// Member id; the suffix of the person URN.
    #[serde(default, rename = "sub")]
    pub subject: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Document,
}

/// Media bytes to upload alongside a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishMedia {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
}

/// A post ready for the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    /// Body plus hashtags.
    pub commentary: String,
    /// Shown with document media.
    pub title: String,
    pub media: Option<PublishMedia>,
}

impl PublishRequest {
    /// Commentary is the body, followed by a blank line and the hashtags
    /// when there are any.
    pub fn commentary_for(body: &str, hashtags: &str) -> String {
        let tags = hashtags.trim();
        if tags.is_empty() {
            body.to_string()
        } else {
            format!("{body}\n\n{tags}")
        }
    }
}

/// Proposes a storytelling order for a group of posts.
#[async_trait]
pub trait NarrativeOrderer: Send + Sync {
    /// Post ids in recommended order. Not guaranteed to be a permutation
    /// of the input.
    async fn narrative_order(&self, posts: &[TitledPost]) -> Result<Vec<PostId>, CollaboratorError>;

    fn adapter_name(&self) -> &str;
}

/// Picks hashtags from a candidate pool.
#[async_trait]
pub trait TagSelector: Send + Sync {
    /// Raw tag strings as returned. May include tags outside the pool.
    async fn select_tags(&self, request: &TagRequest<'_>) -> Result<Vec<String>, CollaboratorError>;

    fn adapter_name(&self) -> &str;
}

/// Writes an image generation prompt for a post.
#[async_trait]
pub trait ImagePrompter: Send + Sync {
    async fn image_prompt(&self, request: &ImagePromptRequest<'_>) -> Result<String, CollaboratorError>;

    fn adapter_name(&self) -> &str;
}

/// Turns a prompt into PNG bytes.
#[async_trait]
pub trait ImageRenderer: Send + Sync {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, CollaboratorError>;

    fn adapter_name(&self) -> &str;
}

/// Publishes a post and returns the external post id.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        credentials: &PublisherCredentials,
        request: &PublishRequest,
    ) -> Result<String, CollaboratorError>;

    /// Check the credentials against the network without posting.
    async fn verify(&self, credentials: &PublisherCredentials) -> Result<AccountProfile, CollaboratorError>;

    fn adapter_name(&self) -> &str;
}
