//! # Anthropic Messages Adapter
//!
//! Serves the three judgment collaborators (narrative order, tag
//! selection, image prompt) through `POST /v1/messages`. Each call sends a
//! fixed system prompt and a short user message, and reads the first text
//! block of the reply.
//!
//! | Collaborator | Max tokens | Reply shape |
//! |--------------|-----------:|-------------|
//! | Narrative order | 150 | JSON array of post ids |
//! | Tag selection | 80 | JSON array of tag strings |
//! | Image prompt | 200 | Plain text |

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cadence_core::PostId;

use crate::config::{endpoint_url, AnthropicConfig};
use crate::error::CollaboratorError;
use crate::retry::RetryPolicy;
use crate::traits::{
    ImagePromptRequest, ImagePrompter, NarrativeOrderer, TagRequest, TagSelector, TitledPost,
};

const API_VERSION: &str = "2023-06-01";
const ENDPOINT: &str = "POST /v1/messages";

const NARRATIVE_SYSTEM: &str = "You are a LinkedIn campaign narrative strategist.\n\
You receive a list of post titles with their IDs.\n\
Return ONLY a JSON array of the IDs in optimal narrative order.\n\
Narrative arc: Hook/Problem, Diagnosis, Reveal/Product, Proof, Vision/CTA.\n\
Example output: [42, 38, 41, 39, 40]";

const TAG_SYSTEM: &str = "You select LinkedIn hashtags for federal IT content.\n\
Respond with JSON array of EXACTLY 4 tags (strings including #).\n\
Pick ONLY from the provided candidates list. No invented tags.\n\
Do not include #BHTLabs; it is added automatically.";

const IMAGE_SYSTEM: &str = "You write DALL-E image generation prompts for LinkedIn post images.\n\
The brand palette is: navy blue, teal, white, warm gold.\n\
Style: minimal, professional, federal IT consulting aesthetic.\n\
Forbidden: people, faces, government seals, circuit boards, light trails, purple tones.\n\
Preferred: abstract data geometry, architectural forms, clean grid patterns, negative space.\n\
Respond with the prompt text ONLY. No explanation. No preamble.\n\
Keep prompt under 180 words.";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Live client for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, CollaboratorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    "x-api-key",
                    reqwest::header::HeaderValue::from_str(&config.api_key)
                        .map_err(|_| CollaboratorError::NotConfigured("anthropic api key"))?,
                );
                headers.insert(
                    "anthropic-version",
                    reqwest::header::HeaderValue::from_static(API_VERSION),
                );
                headers
            })
            .build()
            .map_err(CollaboratorError::transport("client_init"))?;

        Ok(Self {
            http,
            url: endpoint_url(&config.base_url, "v1/messages"),
            model: config.model,
        })
    }

    /// One system + user exchange. Returns the first text block, trimmed.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, CollaboratorError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            system,
            messages: [Message {
                role: "user",
                content: user,
            }],
        };

        let resp = RetryPolicy::default()
            .send(|| self.http.post(&self.url).json(&body).send())
            .await
            .map_err(CollaboratorError::transport(ENDPOINT))?;

        let resp = CollaboratorError::require_success(ENDPOINT, resp).await?;

        let parsed: MessagesResponse =
            resp.json()
                .await
                .map_err(|e| CollaboratorError::Deserialization {
                    endpoint: ENDPOINT.into(),
                    source: e,
                })?;

        parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .map(|t| t.trim().to_string())
            .ok_or_else(|| CollaboratorError::malformed(ENDPOINT, "no text block in reply"))
    }
}

/// Find the first JSON array in a model reply.
///
/// Markdown code fences are ignored. Returns `None` when no array parses.
pub fn parse_json_array(reply: &str) -> Option<Vec<Value>> {
    let unfenced: String = reply
        .lines()
        .filter(|l| !l.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");
    let start = unfenced.find('[')?;
    let end = unfenced.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&unfenced[start..=end]).ok()
}

/// Read a post id from an integer or a numeric string.
fn as_post_id(value: &Value) -> Option<PostId> {
    match value {
        Value::Number(n) => n.as_i64().map(PostId::new),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First `n` characters of `text`.
pub(crate) fn excerpt(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl NarrativeOrderer for AnthropicClient {
    async fn narrative_order(&self, posts: &[TitledPost]) -> Result<Vec<PostId>, CollaboratorError> {
        let list = posts
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. [id:{}] {}", i + 1, p.id, p.title))
            .collect::<Vec<_>>()
            .join("\n");
        let reply = self
            .complete(
                NARRATIVE_SYSTEM,
                &format!("Order these by narrative arc:\n{list}"),
                150,
            )
            .await?;

        let values = parse_json_array(&reply)
            .ok_or_else(|| CollaboratorError::malformed(ENDPOINT, "no JSON array in reply"))?;
        values
            .iter()
            .map(|v| {
                as_post_id(v).ok_or_else(|| {
                    CollaboratorError::malformed(ENDPOINT, format!("not a post id: {v}"))
                })
            })
            .collect()
    }

    fn adapter_name(&self) -> &str {
        "AnthropicClient"
    }
}

#[async_trait]
impl TagSelector for AnthropicClient {
    async fn select_tags(&self, request: &TagRequest<'_>) -> Result<Vec<String>, CollaboratorError> {
        let user = format!(
            "Post type: {}\nTitle: {}\nFirst 200 chars: {}\n\nCandidates:\n{}",
            request.content_type,
            request.title,
            excerpt(request.body, 200),
            request.candidates.join(", ")
        );
        let reply = self.complete(TAG_SYSTEM, &user, 80).await?;
        let values = parse_json_array(&reply)
            .ok_or_else(|| CollaboratorError::malformed(ENDPOINT, "no JSON array in reply"))?;
        Ok(values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect())
    }

    fn adapter_name(&self) -> &str {
        "AnthropicClient"
    }
}

#[async_trait]
impl ImagePrompter for AnthropicClient {
    async fn image_prompt(&self, request: &ImagePromptRequest<'_>) -> Result<String, CollaboratorError> {
        let user = format!(
            "Post type: {}\nPost title: {}\nCore message (first 150 chars): {}\n\n\
             Write a DALL-E prompt for a 1200x627 LinkedIn image.",
            request.content_type,
            request.title,
            excerpt(request.body, 150)
        );
        let prompt = self.complete(IMAGE_SYSTEM, &user, 200).await?;
        if prompt.is_empty() {
            return Err(CollaboratorError::malformed(ENDPOINT, "empty prompt"));
        }
        Ok(prompt)
    }

    fn adapter_name(&self) -> &str {
        "AnthropicClient"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_array() {
        assert_eq!(parse_json_array("[3, 1, 2]"), Some(vec![json!(3), json!(1), json!(2)]));
    }

    #[test]
    fn parses_fenced_array_with_chatter() {
        let reply = "Here you go:\n```json\n[\"#GovTech\", \"#AI\"]\n```";
        assert_eq!(
            parse_json_array(reply),
            Some(vec![json!("#GovTech"), json!("#AI")])
        );
    }

    #[test]
    fn no_array_is_none() {
        assert_eq!(parse_json_array("I cannot help with that."), None);
        assert_eq!(parse_json_array("] backwards ["), None);
        assert_eq!(parse_json_array("[not json"), None);
    }

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        assert_eq!(as_post_id(&json!(42)), Some(PostId::new(42)));
        assert_eq!(as_post_id(&json!(" 7 ")), Some(PostId::new(7)));
        assert_eq!(as_post_id(&json!("seven")), None);
        assert_eq!(as_post_id(&json!(1.5)), None);
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("héllo", 2), "hé");
        assert_eq!(excerpt("hi", 200), "hi");
    }
}
