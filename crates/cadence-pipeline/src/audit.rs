//! # Narrative Audit
//!
//! Asks the narrative collaborator how a campaign's posts should read and
//! compares that with the order they are scheduled in. Nothing is moved;
//! the audit only reports.

use serde::Serialize;

use cadence_client::{Collaborators, TitledPost};
use cadence_core::PostId;
use cadence_schedule::{needs_ordering, validate_order, NarrativeItem};

/// Note returned when there is nothing to compare.
pub const TOO_FEW_POSTS: &str = "Need at least 2 posts to audit.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditVerdict {
    /// The scheduled order is the recommended one.
    Ok,
    /// The collaborator recommends a different order.
    Reorder,
    /// No usable recommendation was available.
    Unchecked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSource {
    Rules,
    Collaborator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrativeAudit {
    pub verdict: AuditVerdict,
    pub notes: Vec<String>,
    /// Present only with [`AuditVerdict::Reorder`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_order: Option<Vec<PostId>>,
    pub source: AuditSource,
}

impl NarrativeAudit {
    fn from_rules(verdict: AuditVerdict, note: impl Into<String>) -> Self {
        Self {
            verdict,
            notes: vec![note.into()],
            suggested_order: None,
            source: AuditSource::Rules,
        }
    }
}

/// Audit `items`, which must be in their scheduled order.
pub async fn audit_narrative(items: &[NarrativeItem], collaborators: &Collaborators) -> NarrativeAudit {
    if !needs_ordering(items) {
        return NarrativeAudit::from_rules(AuditVerdict::Ok, TOO_FEW_POSTS);
    }
    let Some(orderer) = &collaborators.orderer else {
        return NarrativeAudit::from_rules(
            AuditVerdict::Unchecked,
            "No narrative collaborator is configured.",
        );
    };

    let titled: Vec<TitledPost> = items
        .iter()
        .map(|i| TitledPost {
            id: i.id,
            title: i.title.clone(),
        })
        .collect();
    let proposed = match orderer.narrative_order(&titled).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(adapter = orderer.adapter_name(), error = %e, "narrative audit failed");
            return NarrativeAudit::from_rules(
                AuditVerdict::Unchecked,
                format!("Narrative collaborator unavailable: {e}"),
            );
        }
    };
    if let Err(e) = validate_order(items, &proposed) {
        tracing::warn!(adapter = orderer.adapter_name(), error = %e, "narrative audit reply rejected");
        return NarrativeAudit::from_rules(
            AuditVerdict::Unchecked,
            format!("Narrative collaborator reply was unusable: {e}"),
        );
    }

    let moves = moves(items, &proposed);
    if moves.is_empty() {
        return NarrativeAudit {
            verdict: AuditVerdict::Ok,
            notes: vec!["The scheduled order already reads as a narrative.".to_string()],
            suggested_order: None,
            source: AuditSource::Collaborator,
        };
    }
    NarrativeAudit {
        verdict: AuditVerdict::Reorder,
        notes: moves,
        suggested_order: Some(proposed),
        source: AuditSource::Collaborator,
    }
}

/// One note per post whose position changes. Positions are 1-based.
fn moves(items: &[NarrativeItem], proposed: &[PostId]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .filter_map(|(from, item)| {
            let to = proposed.iter().position(|id| *id == item.id)?;
            (to != from).then(|| {
                format!("\"{}\" moves from position {} to {}", item.title, from + 1, to + 1)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cadence_client::mock::{MockNarrativeOrderer, MockPublisher};
    use cadence_core::ContentType;

    fn items(n: i64) -> Vec<NarrativeItem> {
        (1..=n)
            .map(|id| NarrativeItem {
                id: PostId::new(id),
                title: format!("Part {id}"),
                content_type: ContentType::General,
            })
            .collect()
    }

    fn with_orderer(orderer: MockNarrativeOrderer) -> Collaborators {
        Collaborators {
            orderer: Some(Arc::new(orderer)),
            ..Collaborators::offline(Arc::new(MockPublisher::new()))
        }
    }

    #[tokio::test]
    async fn single_post_is_ok_without_asking() {
        let audit = audit_narrative(&items(1), &with_orderer(MockNarrativeOrderer::Failing)).await;
        assert_eq!(audit.verdict, AuditVerdict::Ok);
        assert_eq!(audit.notes, vec![TOO_FEW_POSTS.to_string()]);
        assert_eq!(audit.source, AuditSource::Rules);
    }

    #[tokio::test]
    async fn matching_order_is_ok() {
        let ids = items(2).iter().map(|i| i.id).collect();
        let audit = audit_narrative(&items(2), &with_orderer(MockNarrativeOrderer::Fixed(ids))).await;
        assert_eq!(audit.verdict, AuditVerdict::Ok);
        assert_eq!(audit.source, AuditSource::Collaborator);
        assert!(audit.suggested_order.is_none());
    }

    #[tokio::test]
    async fn different_order_is_reported_with_moves() {
        let audit = audit_narrative(&items(3), &with_orderer(MockNarrativeOrderer::Reverse)).await;
        assert_eq!(audit.verdict, AuditVerdict::Reorder);
        assert_eq!(
            audit.suggested_order,
            Some(vec![PostId::new(3), PostId::new(2), PostId::new(1)])
        );
        assert_eq!(
            audit.notes,
            vec![
                "\"Part 1\" moves from position 1 to 3".to_string(),
                "\"Part 3\" moves from position 3 to 1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn bad_reply_or_failure_is_unchecked() {
        let bad = with_orderer(MockNarrativeOrderer::Fixed(vec![PostId::new(1), PostId::new(1)]));
        assert_eq!(audit_narrative(&items(2), &bad).await.verdict, AuditVerdict::Unchecked);

        let failing = with_orderer(MockNarrativeOrderer::Failing);
        assert_eq!(audit_narrative(&items(2), &failing).await.verdict, AuditVerdict::Unchecked);

        let offline = Collaborators::offline(Arc::new(MockPublisher::new()));
        let audit = audit_narrative(&items(2), &offline).await;
        assert_eq!(audit.verdict, AuditVerdict::Unchecked);
        assert_eq!(audit.source, AuditSource::Rules);
    }
}
