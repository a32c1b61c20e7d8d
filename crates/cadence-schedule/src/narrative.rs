//! # Narrative Assignment
//!
//! Schedules a group of posts that should read as a sequence. An ordering
//! (usually proposed by an external collaborator) is validated as a
//! permutation of the item ids; anything else falls back to the items'
//! original order. Slots are then handed out positionally: the earliest
//! slot to the first item, with no day-preference lookahead.
//!
//! A single item skips ordering and takes its preferred slot.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence_core::{ContentType, PostId};

use crate::slots::{assign_slot, SlotConfig};

/// Reason recorded for a lone item.
pub const SINGLE_ITEM_REASON: &str = "Single item, assigned to its preferred slot";

/// A post awaiting a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeItem {
    pub id: PostId,
    pub title: String,
    pub content_type: ContentType,
}

/// Where an assignment's order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignmentSource {
    /// Single item; day preference decided the slot.
    Preference,
    /// A validated collaborator ordering.
    Collaborator,
    /// The caller's order, used when no valid ordering was supplied.
    OriginalOrder,
}

/// One scheduled (or unschedulable) item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub post_id: PostId,
    /// `None` when the candidate slots ran out.
    pub slot: Option<DateTime<Utc>>,
    pub content_type: ContentType,
    /// 1-based position in the narrative; `None` for a single item.
    pub narrative_position: Option<usize>,
    pub reason: String,
    pub source: AssignmentSource,
}

/// Why a proposed ordering was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("ordering has {got} ids, expected {expected}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("ordering names unknown post {0}")]
    UnknownId(PostId),
    #[error("ordering repeats post {0}")]
    Duplicate(PostId),
}

/// More than one item means an ordering is worth asking for.
pub fn needs_ordering(items: &[NarrativeItem]) -> bool {
    items.len() > 1
}

/// Check that `proposed` is a permutation of the item ids.
pub fn validate_order(items: &[NarrativeItem], proposed: &[PostId]) -> Result<(), OrderError> {
    if proposed.len() != items.len() {
        return Err(OrderError::LengthMismatch {
            expected: items.len(),
            got: proposed.len(),
        });
    }
    let known: HashSet<PostId> = items.iter().map(|i| i.id).collect();
    let mut seen = HashSet::with_capacity(proposed.len());
    for id in proposed {
        if !known.contains(id) {
            return Err(OrderError::UnknownId(*id));
        }
        if !seen.insert(*id) {
            return Err(OrderError::Duplicate(*id));
        }
    }
    Ok(())
}

/// Items in the order they will be scheduled, and where that order came
/// from. An invalid proposal is logged and ignored.
pub fn resolve_order<'a>(
    items: &'a [NarrativeItem],
    proposed: Option<&[PostId]>,
) -> (Vec<&'a NarrativeItem>, AssignmentSource) {
    let Some(proposed) = proposed else {
        return (items.iter().collect(), AssignmentSource::OriginalOrder);
    };
    match validate_order(items, proposed) {
        Ok(()) => {
            let ordered = proposed
                .iter()
                .filter_map(|id| items.iter().find(|i| i.id == *id))
                .collect();
            (ordered, AssignmentSource::Collaborator)
        }
        Err(e) => {
            tracing::warn!(error = %e, "narrative ordering rejected, keeping original order");
            (items.iter().collect(), AssignmentSource::OriginalOrder)
        }
    }
}

/// Assign slots to a batch.
///
/// `slots` must be chronological (as returned by
/// [`available_slots`](crate::available_slots)). Items beyond the supply
/// of slots get `slot: None`.
pub fn assign_batch(
    items: &[NarrativeItem],
    proposed: Option<&[PostId]>,
    slots: &[DateTime<Utc>],
    config: &SlotConfig,
) -> Vec<Assignment> {
    match items {
        [] => Vec::new(),
        [only] => vec![Assignment {
            post_id: only.id,
            slot: assign_slot(only.content_type, slots, config),
            content_type: only.content_type,
            narrative_position: None,
            reason: SINGLE_ITEM_REASON.to_string(),
            source: AssignmentSource::Preference,
        }],
        _ => {
            let (ordered, source) = resolve_order(items, proposed);
            let total = ordered.len();
            ordered
                .into_iter()
                .enumerate()
                .map(|(i, item)| Assignment {
                    post_id: item.id,
                    slot: slots.get(i).copied(),
                    content_type: item.content_type,
                    narrative_position: Some(i + 1),
                    reason: format!("Narrative position {} of {}", i + 1, total),
                    source,
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::available_slots;

    fn item(id: i64, ct: ContentType) -> NarrativeItem {
        NarrativeItem {
            id: PostId::new(id),
            title: format!("Post {id}"),
            content_type: ct,
        }
    }

    fn ids(v: &[i64]) -> Vec<PostId> {
        v.iter().copied().map(PostId::new).collect()
    }

    fn friday() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn empty_batch_is_empty() {
        assert!(assign_batch(&[], None, &[], &SlotConfig::default()).is_empty());
    }

    #[test]
    fn single_item_skips_ordering() {
        let cfg = SlotConfig { horizon_days: 8, ..SlotConfig::default() };
        let slots = available_slots(&[], friday(), &cfg);
        let items = [item(7, ContentType::Vision)];
        // A proposal for a lone item is ignored.
        let out = assign_batch(&items, Some(&ids(&[99])), &slots, &cfg);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].reason, SINGLE_ITEM_REASON);
        assert_eq!(out[0].source, AssignmentSource::Preference);
        assert_eq!(out[0].narrative_position, None);
        assert_eq!(out[0].slot.map(|s| cfg.local_weekday(s)), Some(chrono::Weekday::Fri));
    }

    #[test]
    fn valid_ordering_is_followed_positionally() {
        let cfg = SlotConfig::default();
        let slots = available_slots(&[], friday(), &cfg);
        let items = [
            item(1, ContentType::Vision),
            item(2, ContentType::ProductLaunch),
            item(3, ContentType::CaseStudy),
        ];
        let out = assign_batch(&items, Some(&ids(&[3, 1, 2])), &slots, &cfg);
        let order: Vec<i64> = out.iter().map(|a| a.post_id.get()).collect();
        assert_eq!(order, vec![3, 1, 2]);
        // No preference lookahead: vision lands on Monday here.
        assert_eq!(out[1].slot, Some(slots[1]));
        assert_eq!(out[0].reason, "Narrative position 1 of 3");
        assert!(out.iter().all(|a| a.source == AssignmentSource::Collaborator));
    }

    #[test]
    fn malformed_ordering_falls_back() {
        let items = [item(1, ContentType::General), item(2, ContentType::General)];
        for bad in [ids(&[1]), ids(&[1, 1]), ids(&[1, 5]), ids(&[1, 2, 3])] {
            let (ordered, source) = resolve_order(&items, Some(&bad));
            assert_eq!(source, AssignmentSource::OriginalOrder);
            assert_eq!(ordered[0].id.get(), 1);
        }
    }

    #[test]
    fn validation_reports_the_problem() {
        let items = [item(1, ContentType::General), item(2, ContentType::General)];
        assert_eq!(
            validate_order(&items, &ids(&[1])),
            Err(OrderError::LengthMismatch { expected: 2, got: 1 })
        );
        assert_eq!(
            validate_order(&items, &ids(&[2, 2])),
            Err(OrderError::Duplicate(PostId::new(2)))
        );
        assert_eq!(
            validate_order(&items, &ids(&[2, 9])),
            Err(OrderError::UnknownId(PostId::new(9)))
        );
        assert!(validate_order(&items, &ids(&[2, 1])).is_ok());
    }

    #[test]
    fn items_beyond_supply_are_unscheduled() {
        let items = [item(1, ContentType::General), item(2, ContentType::General)];
        let slots = [friday()];
        let out = assign_batch(&items, None, &slots, &SlotConfig::default());
        assert_eq!(out[0].slot, Some(friday()));
        assert_eq!(out[1].slot, None);
        assert_eq!(out[1].narrative_position, Some(2));
    }

    #[test]
    fn needs_ordering_only_for_groups() {
        assert!(!needs_ordering(&[]));
        assert!(!needs_ordering(&[item(1, ContentType::General)]));
        assert!(needs_ordering(&[item(1, ContentType::General), item(2, ContentType::Proof)]));
    }

    #[test]
    fn source_serializes_kebab_case() {
        let json = serde_json::to_value(AssignmentSource::OriginalOrder).unwrap();
        assert_eq!(json, "original-order");
    }
}
