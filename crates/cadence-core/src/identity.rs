//! # Record Identifiers
//!
//! Integer newtypes for persisted records. Each identifier is a distinct
//! type: a [`PostId`] cannot be passed where a [`CampaignId`] is expected.
//! The raw value is the database sequence number, so identifiers serialize
//! as plain JSON integers.

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw sequence value.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw sequence value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

record_id!(
    /// A content item scheduled for publication.
    PostId
);

record_id!(
    /// A named group of posts published as one narrative.
    CampaignId
);

record_id!(
    /// A media file attached to a post.
    AssetId
);

record_id!(
    /// One row of the compliance audit trail.
    FindingId
);
