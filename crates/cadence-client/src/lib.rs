//! # cadence-client
//!
//! External collaborators used by the posting pipeline:
//!
//! - **Narrative ordering**, **tag selection** and **image prompts** via the
//!   Anthropic Messages API ([`anthropic`])
//! - **Image rendering** via OpenAI DALL-E ([`openai`])
//! - **Publishing** via the LinkedIn REST API ([`linkedin`])
//!
//! Every collaborator sits behind a trait in [`traits`], with a scripted
//! stand-in in [`mock`]. Callers own validation and fallbacks; this crate
//! only moves bytes and reports failures.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod linkedin;
pub mod mock;
pub mod openai;
pub(crate) mod retry;
pub mod traits;

use std::sync::Arc;

pub use config::ClientConfig;
pub use error::CollaboratorError;
pub use traits::{
    AccountProfile, ImagePromptRequest, ImagePrompter, ImageRenderer, MediaKind, NarrativeOrderer, PublishMedia,
    PublishRequest, Publisher, PublisherCredentials, TagRequest, TagSelector, TitledPost,
};

/// The set of collaborators available to the pipeline.
///
/// Absent judgment collaborators mean "take the fallback". The publisher
/// is always present; it needs credentials at call time instead.
#[derive(Clone)]
pub struct Collaborators {
    pub orderer: Option<Arc<dyn NarrativeOrderer>>,
    pub tagger: Option<Arc<dyn TagSelector>>,
    pub prompter: Option<Arc<dyn ImagePrompter>>,
    pub renderer: Option<Arc<dyn ImageRenderer>>,
    pub publisher: Arc<dyn Publisher>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("orderer", &self.orderer.as_ref().map(|c| c.adapter_name().to_string()))
            .field("tagger", &self.tagger.as_ref().map(|c| c.adapter_name().to_string()))
            .field("prompter", &self.prompter.as_ref().map(|c| c.adapter_name().to_string()))
            .field("renderer", &self.renderer.as_ref().map(|c| c.adapter_name().to_string()))
            .field("publisher", &self.publisher.adapter_name())
            .finish()
    }
}

impl Collaborators {
    /// Build live adapters for whatever the configuration enables.
    pub fn from_config(config: &ClientConfig) -> Result<Self, CollaboratorError> {
        let anthropic = config
            .anthropic
            .clone()
            .map(anthropic::AnthropicClient::new)
            .transpose()?
            .map(Arc::new);
        let renderer = config
            .openai
            .clone()
            .map(openai::OpenAiImageClient::new)
            .transpose()?
            .map(|c| Arc::new(c) as Arc<dyn ImageRenderer>);
        let publisher = Arc::new(linkedin::LinkedInPublisher::new(config.linkedin.clone())?);

        Ok(Self {
            orderer: anthropic.clone().map(|c| c as Arc<dyn NarrativeOrderer>),
            tagger: anthropic.clone().map(|c| c as Arc<dyn TagSelector>),
            prompter: anthropic.map(|c| c as Arc<dyn ImagePrompter>),
            renderer,
            publisher,
        })
    }

    /// No judgment collaborators; publishing goes to `publisher`.
    pub fn offline(publisher: Arc<dyn Publisher>) -> Self {
        Self {
            orderer: None,
            tagger: None,
            prompter: None,
            renderer: None,
            publisher,
        }
    }
}
