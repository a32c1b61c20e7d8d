//! # API Route Modules
//!
//! Each module exposes a `router()` returning `Router<AppState>`; the
//! application merges them under the authenticated layer in [`crate::app`].

pub mod assets;
pub mod campaigns;
pub mod compliance;
pub mod pipeline;
pub mod posts;
pub mod schedule;
pub mod settings;
pub mod stats;
