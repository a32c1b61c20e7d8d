//! # cadence-pipeline
//!
//! Takes a draft post from raw text to a publish-ready record. The
//! compliance engine runs first and can stop everything; tagging, imagery
//! and scheduling follow, each degrading to a fixed fallback when its
//! collaborator is missing or misbehaves.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`pipeline`] | `process_post`, `schedule_campaign`, `process_campaign` |
//! | [`tags`] | Taxonomy-validated tag lines and the default line |
//! | [`imagery`] | Prompt, compliance gate, render, write to uploads |
//! | [`audit`] | Compare a campaign's scheduled order with the recommended one |

pub mod audit;
pub mod imagery;
pub mod pipeline;
pub mod tags;

pub use audit::{audit_narrative, AuditSource, AuditVerdict, NarrativeAudit, TOO_FEW_POSTS};
pub use imagery::{fallback_prompt, generate_image, GeneratedImage, ImageSubject, BRAND_PALETTE};
pub use pipeline::{
    process_campaign, process_post, schedule_campaign, CampaignSummary, PipelineOptions,
    PostInput, ProcessOutcome, ProcessedPost, Rejection, REJECTION_REASON,
};
pub use tags::{fallback_tags, select_tags, validate_tags};
