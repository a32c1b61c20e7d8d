//! # Imagery
//!
//! A prompter writes the image prompt, the compliance engine gates it, and
//! a renderer turns it into PNG bytes that are written to the uploads
//! directory. The prompter falls back to a brand template. Any other
//! failure means the post simply gets no image.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cadence_client::{ImagePromptRequest, ImagePrompter, ImageRenderer};
use cadence_core::{ContentType, PostId};

/// Brand colours every generated image uses.
pub const BRAND_PALETTE: &str =
    "Navy blue (#0B1F3E), teal (#31748E), white, warm gold (#C49A2A). No purple.";

/// How long the prompter gets before the template is used instead.
const PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Prompt used when no prompter is available or it fails.
pub fn fallback_prompt() -> String {
    format!(
        "Minimal abstract data visualisation. {BRAND_PALETTE} color palette. Clean geometry, \
         professional federal consulting aesthetic. No people, no text. 1200x627 horizontal format."
    )
}

/// Run a prompt through the compliance engine and return the text to use.
pub fn gate_prompt(prompt: &str) -> String {
    let result = cadence_compliance::evaluate(prompt);
    if !result.pass {
        let rules: Vec<_> = result.unfixable.iter().map(|f| f.rule_id).collect();
        tracing::warn!(?rules, "image prompt carries unfixable findings");
    }
    result.fixed_text
}

/// A rendered image saved to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedImage {
    pub filename: String,
    pub original_name: String,
    pub path: PathBuf,
    pub file_size: u64,
    /// Kept for audit.
    pub prompt: String,
}

/// `auto-{post_id}-{unix_millis}.png`.
pub fn image_filename(post_id: PostId, at: DateTime<Utc>) -> String {
    format!("auto-{}-{}.png", post_id, at.timestamp_millis())
}

/// What the image is made for.
#[derive(Debug, Clone, Copy)]
pub struct ImageSubject<'a> {
    pub post_id: PostId,
    pub content_type: ContentType,
    pub title: &'a str,
    pub body: &'a str,
}

async fn write_prompt(prompter: Option<&dyn ImagePrompter>, subject: &ImageSubject<'_>) -> String {
    let Some(prompter) = prompter else {
        return fallback_prompt();
    };
    let request = ImagePromptRequest {
        content_type: subject.content_type,
        title: subject.title,
        body: subject.body,
    };
    match tokio::time::timeout(PROMPT_TIMEOUT, prompter.image_prompt(&request)).await {
        Ok(Ok(prompt)) => prompt,
        Ok(Err(e)) => {
            tracing::warn!(
                adapter = prompter.adapter_name(),
                error = %e,
                "image prompt failed, using template"
            );
            fallback_prompt()
        }
        Err(_) => {
            tracing::warn!(
                adapter = prompter.adapter_name(),
                "image prompt timed out, using template"
            );
            fallback_prompt()
        }
    }
}

/// Generate and store an image. Returns `None` when no renderer is
/// configured or any step after prompting fails.
pub async fn generate_image(
    prompter: Option<&dyn ImagePrompter>,
    renderer: Option<&dyn ImageRenderer>,
    subject: &ImageSubject<'_>,
    uploads_dir: &Path,
    now: DateTime<Utc>,
) -> Option<GeneratedImage> {
    let Some(renderer) = renderer else {
        tracing::debug!(post_id = %subject.post_id, "no image renderer configured");
        return None;
    };
    let prompt = gate_prompt(&write_prompt(prompter, subject).await);

    let bytes = match renderer.render(&prompt).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                post_id = %subject.post_id,
                adapter = renderer.adapter_name(),
                error = %e,
                "image render failed"
            );
            return None;
        }
    };

    let filename = image_filename(subject.post_id, now);
    let path = uploads_dir.join(&filename);
    if let Err(e) = tokio::fs::create_dir_all(uploads_dir).await {
        tracing::warn!(dir = %uploads_dir.display(), error = %e, "cannot create uploads dir");
        return None;
    }
    if let Err(e) = tokio::fs::write(&path, &bytes).await {
        tracing::warn!(path = %path.display(), error = %e, "cannot write image");
        return None;
    }

    tracing::info!(post_id = %subject.post_id, filename = %filename, "image generated");
    Some(GeneratedImage {
        filename,
        original_name: format!("bht-post-{}.png", subject.post_id),
        path,
        file_size: bytes.len() as u64,
        prompt,
    })
}
