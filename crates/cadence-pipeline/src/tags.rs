//! # Tag Selection
//!
//! A collaborator picks tags from the content type's candidate pool. Its
//! reply is never trusted: unknown tags are dropped, the mandatory tag is
//! prepended, duplicates are removed case-insensitively and the line is
//! capped at [`MAX_TAGS`]. Any collaborator failure falls back to the
//! mandatory tag plus the head of the candidate pool.

use cadence_client::{TagRequest, TagSelector};
use cadence_core::taxonomy::{candidate_pool, canonical, MANDATORY_TAG, MAX_TAGS};
use cadence_core::ContentType;

/// Tags taken from a collaborator reply before the mandatory tag is added.
const SELECTED_CAP: usize = 4;

fn push_unique(line: &mut Vec<&'static str>, tag: &'static str) {
    if !line.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        line.push(tag);
    }
}

fn finish(tags: impl IntoIterator<Item = &'static str>) -> String {
    let mut line = vec![MANDATORY_TAG];
    for tag in tags {
        push_unique(&mut line, tag);
    }
    line.truncate(MAX_TAGS);
    line.join(" ")
}

/// Turn a raw collaborator reply into a tag line.
///
/// Tags are matched against the full taxonomy (not just the pool), with or
/// without `#`, and rewritten to the taxonomy's spelling.
pub fn validate_tags(raw: &[String]) -> String {
    finish(raw.iter().filter_map(|t| canonical(t)).take(SELECTED_CAP))
}

/// The tag line used when no usable reply is available.
pub fn fallback_tags(candidates: &[&'static str]) -> String {
    finish(candidates.iter().copied().take(SELECTED_CAP))
}

/// Select tags for a post, falling back when the collaborator is absent
/// or fails.
pub async fn select_tags(
    tagger: Option<&dyn TagSelector>,
    content_type: ContentType,
    title: &str,
    body: &str,
) -> String {
    let candidates = candidate_pool(content_type);
    let Some(tagger) = tagger else {
        return fallback_tags(&candidates);
    };
    let request = TagRequest {
        content_type,
        title,
        body,
        candidates: &candidates,
    };
    match tagger.select_tags(&request).await {
        Ok(raw) => validate_tags(&raw),
        Err(e) => {
            tracing::warn!(
                adapter = tagger.adapter_name(),
                error = %e,
                "tag selection failed, using default tags"
            );
            fallback_tags(&candidates)
        }
    }
}
