//! # Content Vocabulary
//!
//! Post lifecycle status, asset kinds, and the keyword-based content-type
//! classifier that keys the scheduling and tagging preference tables.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Post lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a post.
///
/// ```text
/// Scheduled --publish ok--> Posted
/// Scheduled --publish err--> Failed --retry--> Scheduled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    /// Waiting for its publish time.
    #[default]
    Scheduled,
    /// Published; carries an external post id.
    Posted,
    /// The last publish attempt failed; carries an error message.
    Failed,
}

impl PostStatus {
    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Posted => "posted",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PostStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "posted" => Ok(Self::Posted),
            "failed" => Ok(Self::Failed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Assets
// ---------------------------------------------------------------------------

/// Kind of media attached to a post. Publishing prefers an image over a
/// document; `Other` is stored but never uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Image,
    Document,
    Other,
}

impl AssetType {
    /// Infer the asset kind from a file name's extension.
    pub fn from_filename(name: &str) -> Self {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" => Self::Image,
            "pdf" => Self::Document,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

impl FromStr for AssetType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "document" => Ok(Self::Document),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::UnknownAssetType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

/// Editorial classification of a post.
///
/// Derived from the post text by [`classify`], never supplied by the author.
/// Used as the key into the day-preference and hashtag candidate tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    ProductLaunch,
    CaseStudy,
    Vision,
    Proof,
    Insight,
    Educational,
    ThoughtLeadership,
    General,
}

impl ContentType {
    /// Every classification, in tie-break order.
    pub const ALL: [ContentType; 8] = [
        Self::ProductLaunch,
        Self::CaseStudy,
        Self::Vision,
        Self::Proof,
        Self::Insight,
        Self::Educational,
        Self::ThoughtLeadership,
        Self::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProductLaunch => "product-launch",
            Self::CaseStudy => "case-study",
            Self::Vision => "vision",
            Self::Proof => "proof",
            Self::Insight => "insight",
            Self::Educational => "educational",
            Self::ThoughtLeadership => "thought-leadership",
            Self::General => "general",
        }
    }

    /// Lowercase keyword fragments that vote for this classification.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::ProductLaunch => &[
                "launch",
                "introducing",
                "announc",
                "now available",
                "unveil",
                "release",
            ],
            Self::CaseStudy => &[
                "case study",
                "we helped",
                "delivered",
                "engagement",
                "outcome",
                "client",
            ],
            Self::Vision => &[
                "vision",
                "future",
                "imagine",
                "next decade",
                "what comes next",
                "long term",
            ],
            Self::Proof => &[
                "results",
                "measured",
                "evidence",
                "benchmark",
                "the numbers",
                "data shows",
            ],
            Self::Insight => &[
                "insight",
                "lesson",
                "learned",
                "noticed",
                "pattern",
                "observation",
            ],
            Self::Educational => &[
                "how to",
                "guide",
                "step-by-step",
                "explained",
                "tutorial",
                "tips",
            ],
            Self::ThoughtLeadership => &[
                "we believe",
                "perspective",
                "industry",
                "leaders",
                "should",
                "opinion",
            ],
            Self::General => &[],
        }
    }
}

impl FromStr for ContentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownContentType(s.to_string()))
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify post text by keyword votes.
///
/// Each type scores one point per keyword fragment present in the
/// lowercased text. The highest score wins; ties go to the type declared
/// first in [`ContentType::ALL`]; no votes at all yields
/// [`ContentType::General`].
pub fn classify(text: &str) -> ContentType {
    let lowered = text.to_lowercase();
    let mut best = ContentType::General;
    let mut best_score = 0usize;
    for ct in ContentType::ALL {
        let score = ct
            .keywords()
            .iter()
            .filter(|kw| lowered.contains(*kw))
            .count();
        if score > best_score {
            best = ct;
            best_score = score;
        }
    }
    best
}
