//! # Post Pipeline
//!
//! Order of operations for one post:
//!
//! 1. Compliance, always first. Unfixable findings, or block rules that
//!    survive the fixes, reject the post and nothing else runs.
//! 2. Tags, when the post has none and tagging is on.
//! 3. Image, when the post has none, imaging is on, and an uploads
//!    directory is configured.
//! 4. Slot, when scheduling is on.
//!
//! Collaborator failures never propagate; each step has a fallback.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use cadence_client::{Collaborators, TitledPost};
use cadence_compliance::{evaluate_post, Finding, FixedPost};
use cadence_core::taxonomy::FALLBACK_TAG_LINE;
use cadence_core::{classify, ContentType, PostId};
use cadence_schedule::{
    assign_batch, assign_slot, available_slots, needs_ordering, Assignment, NarrativeItem,
    SlotConfig,
};

use crate::imagery::{generate_image, GeneratedImage, ImageSubject};
use crate::tags::select_tags;

/// What the pipeline is allowed to do.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub auto_tag: bool,
    pub auto_image: bool,
    pub auto_schedule: bool,
    /// Where generated images are written. `None` disables imaging.
    pub uploads_dir: Option<PathBuf>,
    pub slots: SlotConfig,
    pub now: DateTime<Utc>,
}

impl PipelineOptions {
    /// Every step enabled, with default slot settings.
    pub fn all(uploads_dir: Option<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            auto_tag: true,
            auto_image: true,
            auto_schedule: true,
            uploads_dir,
            slots: SlotConfig::default(),
            now,
        }
    }
}

/// A post entering the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub hashtags: String,
    /// Already carries an image asset.
    pub has_image: bool,
}

/// A post that cleared compliance.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedPost {
    pub post_id: PostId,
    pub fixed: FixedPost,
    pub tags: String,
    pub image: Option<GeneratedImage>,
    /// `None` when scheduling is off or no slot was free.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub content_type: ContentType,
    pub violations: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub auto_fixed: bool,
}

/// A post stopped at the compliance gate.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub post_id: PostId,
    pub reason: String,
    /// Findings with no fix.
    pub violations: Vec<Finding>,
    pub residual: Vec<&'static str>,
    pub warnings: Vec<Finding>,
}

/// Result of processing one post.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ProcessOutcome {
    Accepted(ProcessedPost),
    Rejected(Rejection),
}

impl ProcessOutcome {
    pub fn post_id(&self) -> PostId {
        match self {
            Self::Accepted(p) => p.post_id,
            Self::Rejected(r) => r.post_id,
        }
    }

    pub fn accepted(&self) -> Option<&ProcessedPost> {
        match self {
            Self::Accepted(p) => Some(p),
            Self::Rejected(_) => None,
        }
    }
}

/// Upper bound on the whole tagging step, retries included.
const TAG_STEP_TIMEOUT: Duration = Duration::from_secs(90);

/// Upper bound on prompting, rendering and writing one image.
const IMAGE_STEP_TIMEOUT: Duration = Duration::from_secs(90);

/// Reason recorded on a compliance rejection.
pub const REJECTION_REASON: &str = "Compliance violations that cannot be auto-fixed";

/// Run one post through the pipeline.
pub async fn process_post(
    post: &PostInput,
    occupied: &[DateTime<Utc>],
    collaborators: &Collaborators,
    options: &PipelineOptions,
) -> ProcessOutcome {
    let compliance = evaluate_post(&post.title, &post.body, &post.hashtags);
    if !compliance.is_resolved() {
        tracing::info!(
            post_id = %post.id,
            unfixable = compliance.unfixable.len(),
            residual = compliance.residual.len(),
            "post rejected at compliance gate"
        );
        return ProcessOutcome::Rejected(Rejection {
            post_id: post.id,
            reason: REJECTION_REASON.to_string(),
            violations: compliance.unfixable,
            residual: compliance.residual,
            warnings: compliance.warnings,
        });
    }

    let fixed = compliance.fixed;
    let content_type = classify(&fixed.body);

    let tags = if !fixed.hashtags.trim().is_empty() {
        fixed.hashtags.clone()
    } else if options.auto_tag {
        let step = select_tags(
            collaborators.tagger.as_deref(),
            content_type,
            &fixed.title,
            &fixed.body,
        );
        match tokio::time::timeout(TAG_STEP_TIMEOUT, step).await {
            Ok(tags) => tags,
            Err(_) => {
                tracing::warn!(post_id = %post.id, "tag step timed out, using default line");
                FALLBACK_TAG_LINE.to_string()
            }
        }
    } else {
        String::new()
    };

    let image = match (&options.uploads_dir, options.auto_image && !post.has_image) {
        (Some(dir), true) => {
            let subject = ImageSubject {
                post_id: post.id,
                content_type,
                title: &fixed.title,
                body: &fixed.body,
            };
            let step = generate_image(
                collaborators.prompter.as_deref(),
                collaborators.renderer.as_deref(),
                &subject,
                dir,
                options.now,
            );
            match tokio::time::timeout(IMAGE_STEP_TIMEOUT, step).await {
                Ok(image) => image,
                Err(_) => {
                    tracing::warn!(post_id = %post.id, "image step timed out, continuing without one");
                    None
                }
            }
        }
        _ => None,
    };

    let scheduled_at = if options.auto_schedule {
        let slots = available_slots(occupied, options.now, &options.slots);
        let slot = assign_slot(content_type, &slots, &options.slots);
        if slot.is_none() {
            tracing::warn!(post_id = %post.id, "no free slot inside the horizon");
        }
        slot
    } else {
        None
    };

    ProcessOutcome::Accepted(ProcessedPost {
        post_id: post.id,
        fixed,
        tags,
        image,
        scheduled_at,
        content_type,
        violations: compliance.violations,
        warnings: compliance.warnings,
        auto_fixed: compliance.auto_fixed,
    })
}

/// Assign slots to a group of posts, asking the narrative collaborator
/// for an order when there is more than one.
pub async fn schedule_campaign(
    items: &[NarrativeItem],
    occupied: &[DateTime<Utc>],
    collaborators: &Collaborators,
    config: &SlotConfig,
    now: DateTime<Utc>,
) -> Vec<Assignment> {
    if items.is_empty() {
        return Vec::new();
    }
    let slots = available_slots(occupied, now, config);

    let proposed = match (&collaborators.orderer, needs_ordering(items)) {
        (Some(orderer), true) => {
            let titled: Vec<TitledPost> = items
                .iter()
                .map(|i| TitledPost {
                    id: i.id,
                    title: i.title.clone(),
                })
                .collect();
            match orderer.narrative_order(&titled).await {
                Ok(ids) => Some(ids),
                Err(e) => {
                    tracing::warn!(
                        adapter = orderer.adapter_name(),
                        error = %e,
                        "narrative ordering failed, keeping original order"
                    );
                    None
                }
            }
        }
        _ => None,
    };

    assign_batch(items, proposed.as_deref(), &slots, config)
}

/// Aggregate result of a campaign run.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub imaged: usize,
    pub auto_fixed: usize,
    pub results: Vec<ProcessOutcome>,
}

/// Process posts one after another. Each accepted post's slot joins the
/// occupied set before the next post is scheduled.
pub async fn process_campaign(
    posts: &[PostInput],
    occupied: &[DateTime<Utc>],
    collaborators: &Collaborators,
    options: &PipelineOptions,
) -> CampaignSummary {
    let mut occupied = occupied.to_vec();
    let mut results = Vec::with_capacity(posts.len());

    for post in posts {
        let outcome = process_post(post, &occupied, collaborators, options).await;
        if let Some(slot) = outcome.accepted().and_then(|p| p.scheduled_at) {
            occupied.push(slot);
        }
        results.push(outcome);
    }

    let accepted: Vec<&ProcessedPost> = results.iter().filter_map(ProcessOutcome::accepted).collect();
    CampaignSummary {
        total: results.len(),
        succeeded: accepted.len(),
        failed: results.len() - accepted.len(),
        imaged: accepted.iter().filter(|p| p.image.is_some()).count(),
        auto_fixed: accepted.iter().filter(|p| p.auto_fixed).count(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_client::mock::{MockImageRenderer, MockPublisher};
    use std::sync::Arc;

    fn friday() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn offline() -> Collaborators {
        Collaborators::offline(Arc::new(MockPublisher::new()))
    }

    fn post(id: i64, body: &str) -> PostInput {
        PostInput {
            id: PostId::new(id),
            title: format!("Post {id}"),
            body: body.to_string(),
            hashtags: String::new(),
            has_image: false,
        }
    }

    #[tokio::test]
    async fn unfixable_post_is_rejected_before_anything_else() {
        let options = PipelineOptions::all(None, friday());
        let outcome = process_post(
            &post(1, "The SEC was our client for three years."),
            &[],
            &offline(),
            &options,
        )
        .await;
        let ProcessOutcome::Rejected(r) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(r.violations[0].rule_id, "sec-relationship");
        assert_eq!(r.reason, REJECTION_REASON);
    }

    #[tokio::test]
    async fn fixable_post_is_fixed_tagged_and_scheduled() {
        let options = PipelineOptions::all(None, friday());
        let outcome = process_post(
            &post(2, "We're thrilled to announce our solution for agencies."),
            &[],
            &offline(),
            &options,
        )
        .await;
        let p = outcome.accepted().unwrap();
        assert!(p.auto_fixed);
        assert!(!p.fixed.body.contains("thrilled"));
        assert!(p.tags.starts_with("#BHTLabs"));
        assert!(p.scheduled_at.is_some());
        assert!(p.image.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_renderer_does_not_hold_up_the_post() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Arc::new(MockImageRenderer::stalled());
        let collaborators = Collaborators {
            renderer: Some(renderer.clone()),
            ..offline()
        };
        let options = PipelineOptions::all(Some(dir.path().to_path_buf()), friday());
        let outcome = process_post(&post(4, "Plain update."), &[], &collaborators, &options).await;
        let ProcessOutcome::Accepted(p) = outcome else {
            panic!("expected acceptance");
        };
        assert!(p.image.is_none());
        assert!(p.scheduled_at.is_some());
        assert_eq!(renderer.prompts().len(), 1);
    }

    #[tokio::test]
    async fn existing_hashtags_are_kept() {
        let mut input = post(3, "Plain update.");
        input.hashtags = "#GovTech".into();
        let outcome = process_post(&input, &[], &offline(), &PipelineOptions::all(None, friday())).await;
        assert_eq!(outcome.accepted().unwrap().tags, "#GovTech");
    }

    #[tokio::test]
    async fn disabled_steps_do_nothing() {
        let options = PipelineOptions {
            auto_tag: false,
            auto_image: false,
            auto_schedule: false,
            ..PipelineOptions::all(None, friday())
        };
        let outcome = process_post(&post(4, "Plain update."), &[], &offline(), &options).await;
        let p = outcome.accepted().unwrap();
        assert_eq!(p.tags, "");
        assert_eq!(p.scheduled_at, None);
    }

    #[tokio::test]
    async fn exhausted_allocator_reports_no_slot() {
        let options = PipelineOptions {
            slots: SlotConfig { horizon_days: 2, ..SlotConfig::default() },
            ..PipelineOptions::all(None, friday())
        };
        // Friday + 2 days is the weekend.
        let outcome = process_post(&post(5, "Plain update."), &[], &offline(), &options).await;
        assert_eq!(outcome.accepted().unwrap().scheduled_at, None);
    }

    #[tokio::test]
    async fn empty_campaign_schedules_nothing() {
        let out = schedule_campaign(&[], &[], &offline(), &SlotConfig::default(), friday()).await;
        assert!(out.is_empty());
    }
}
