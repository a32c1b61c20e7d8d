//! # cadence-core
//!
//! Shared vocabulary for every other Cadence crate. Nothing here performs
//! I/O; the types are plain data plus a handful of pure lookups.
//!
//! | Module | Contents |
//! |---|---|
//! | [`identity`] | Integer newtypes for persisted records |
//! | [`content`] | Post status, asset type, content-type classifier |
//! | [`taxonomy`] | Fixed hashtag taxonomy and per-type candidate pools |
//! | [`error`] | Validation errors shared by the API and CLI |

pub mod content;
pub mod error;
pub mod identity;
pub mod taxonomy;

pub use content::{classify, AssetType, ContentType, PostStatus};
pub use error::ValidationError;
pub use identity::{AssetId, CampaignId, FindingId, PostId};
