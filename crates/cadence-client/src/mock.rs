//! Deterministic collaborators for tests and offline runs.
//!
//! Each mock either replies with a fixed value or fails on every call.
//! [`MockPublisher`] also records what it was asked to publish.

use async_trait::async_trait;
use parking_lot::Mutex;

use cadence_core::PostId;

use crate::error::CollaboratorError;
use crate::traits::{
    AccountProfile, ImagePromptRequest, ImagePrompter, ImageRenderer, NarrativeOrderer, PublishRequest, Publisher,
    PublisherCredentials, TagRequest, TagSelector, TitledPost,
};

fn failure(what: &str) -> CollaboratorError {
    CollaboratorError::malformed("mock", format!("{what} configured to fail"))
}

/// Narrative orderer with scripted behaviour.
#[derive(Debug, Clone)]
pub enum MockNarrativeOrderer {
    /// Reverse the input order.
    Reverse,
    /// Return these ids regardless of input.
    Fixed(Vec<PostId>),
    Failing,
}

#[async_trait]
impl NarrativeOrderer for MockNarrativeOrderer {
    async fn narrative_order(&self, posts: &[TitledPost]) -> Result<Vec<PostId>, CollaboratorError> {
        match self {
            Self::Reverse => Ok(posts.iter().rev().map(|p| p.id).collect()),
            Self::Fixed(ids) => Ok(ids.clone()),
            Self::Failing => Err(failure("narrative orderer")),
        }
    }

    fn adapter_name(&self) -> &str {
        "MockNarrativeOrderer"
    }
}

/// Tag selector with a scripted reply.
#[derive(Debug, Clone)]
pub enum MockTagSelector {
    Reply(Vec<String>),
    /// The first `n` candidates, as a well-behaved selector would.
    FirstCandidates(usize),
    Failing,
}

#[async_trait]
impl TagSelector for MockTagSelector {
    async fn select_tags(&self, request: &TagRequest<'_>) -> Result<Vec<String>, CollaboratorError> {
        match self {
            Self::Reply(tags) => Ok(tags.clone()),
            Self::FirstCandidates(n) => Ok(request
                .candidates
                .iter()
                .take(*n)
                .map(|t| t.to_string())
                .collect()),
            Self::Failing => Err(failure("tag selector")),
        }
    }

    fn adapter_name(&self) -> &str {
        "MockTagSelector"
    }
}

/// Image prompter with a scripted reply.
#[derive(Debug, Clone)]
pub enum MockImagePrompter {
    Reply(String),
    Failing,
    /// Never answers.
    Stalled,
}

#[async_trait]
impl ImagePrompter for MockImagePrompter {
    async fn image_prompt(&self, _request: &ImagePromptRequest<'_>) -> Result<String, CollaboratorError> {
        match self {
            Self::Reply(prompt) => Ok(prompt.clone()),
            Self::Failing => Err(failure("image prompter")),
            Self::Stalled => std::future::pending().await,
        }
    }

    fn adapter_name(&self) -> &str {
        "MockImagePrompter"
    }
}

/// Image renderer that records the prompts it receives.
#[derive(Debug)]
pub struct MockImageRenderer {
    bytes: Option<Vec<u8>>,
    stalled: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockImageRenderer {
    /// Render every prompt to `bytes`.
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            stalled: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            bytes: None,
            stalled: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Record the prompt, then never answer.
    pub fn stalled() -> Self {
        Self {
            bytes: None,
            stalled: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ImageRenderer for MockImageRenderer {
    async fn render(&self, prompt: &str) -> Result<Vec<u8>, CollaboratorError> {
        self.prompts.lock().push(prompt.to_string());
        if self.stalled {
            return std::future::pending().await;
        }
        self.bytes.clone().ok_or_else(|| failure("image renderer"))
    }

    fn adapter_name(&self) -> &str {
        "MockImageRenderer"
    }
}

/// Publisher that records requests and returns sequential ids.
#[derive(Debug, Default)]
pub struct MockPublisher {
    fail_with: Option<String>,
    published: Mutex<Vec<PublishRequest>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<PublishRequest> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(
        &self,
        _credentials: &PublisherCredentials,
        request: &PublishRequest,
    ) -> Result<String, CollaboratorError> {
        if let Some(message) = &self.fail_with {
            return Err(CollaboratorError::ApiError {
                endpoint: "POST /rest/posts".into(),
                status: 422,
                body: message.clone(),
            });
        }
        let mut published = self.published.lock();
        published.push(request.clone());
        Ok(format!("urn:li:share:{}", published.len()))
    }

    async fn verify(&self, credentials: &PublisherCredentials) -> Result<AccountProfile, CollaboratorError> {
        if let Some(message) = &self.fail_with {
            return Err(CollaboratorError::ApiError {
                endpoint: "GET /v2/userinfo".into(),
                status: 401,
                body: message.clone(),
            });
        }
        Ok(AccountProfile {
            name: Some("Mock Member".into()),
            subject: credentials.person_urn.rsplit(':').next().map(str::to_string),
            picture: None,
        })
    }

    fn adapter_name(&self) -> &str {
        "MockPublisher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::ContentType;

    #[tokio::test]
    async fn reverse_orderer_reverses() {
        let posts = [
            TitledPost { id: PostId::new(1), title: "a".into() },
            TitledPost { id: PostId::new(2), title: "b".into() },
        ];
        let order = MockNarrativeOrderer::Reverse.narrative_order(&posts).await.unwrap();
        assert_eq!(order, vec![PostId::new(2), PostId::new(1)]);
    }

    #[tokio::test]
    async fn first_candidates_selector_takes_prefix() {
        let candidates = ["#BHTLabs", "#GovTech", "#AI"];
        let req = TagRequest {
            content_type: ContentType::General,
            title: "t",
            body: "b",
            candidates: &candidates,
        };
        let tags = MockTagSelector::FirstCandidates(2).select_tags(&req).await.unwrap();
        assert_eq!(tags, vec!["#BHTLabs", "#GovTech"]);
    }

    #[tokio::test]
    async fn publisher_numbers_posts_and_records_them() {
        let publisher = MockPublisher::new();
        let creds = PublisherCredentials {
            access_token: "t".into(),
            person_urn: "urn:li:person:1".into(),
        };
        let req = PublishRequest {
            commentary: "hello".into(),
            title: "t".into(),
            media: None,
        };
        assert_eq!(publisher.publish(&creds, &req).await.unwrap(), "urn:li:share:1");
        assert_eq!(publisher.publish(&creds, &req).await.unwrap(), "urn:li:share:2");
        assert_eq!(publisher.published().len(), 2);
    }

    #[tokio::test]
    async fn failing_publisher_errors() {
        let publisher = MockPublisher::failing("token expired");
        let creds = PublisherCredentials {
            access_token: "t".into(),
            person_urn: "u".into(),
        };
        let req = PublishRequest {
            commentary: "c".into(),
            title: "t".into(),
            media: None,
        };
        let err = publisher.publish(&creds, &req).await.unwrap_err();
        assert!(err.to_string().contains("token expired"));
    }

    #[tokio::test]
    async fn publisher_verify_echoes_member_id() {
        let creds = PublisherCredentials {
            access_token: "t".into(),
            person_urn: "urn:li:person:abc".into(),
        };
        let profile = MockPublisher::new().verify(&creds).await.unwrap();
        assert_eq!(profile.subject.as_deref(), Some("abc"));
        assert!(MockPublisher::failing("revoked").verify(&creds).await.is_err());
    }
}
