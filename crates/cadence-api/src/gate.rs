//! # Compliance Gate
//!
//! Every path that gives a post a slot or sends it to the publisher runs
//! the post through [`check_post`] first. Fixable findings pass; a post
//! with unfixable findings, or with block rules that survive the fixes,
//! is refused.

use serde::Serialize;

use cadence_compliance::{evaluate_post, Finding, PostComplianceResult};
use cadence_pipeline::REJECTION_REASON;

use crate::error::AppError;
use crate::state::PostRecord;

/// Why a post may not be scheduled or published.
#[derive(Debug, Clone, Serialize)]
pub struct Blocked {
    /// Findings with no fix.
    pub violations: Vec<Finding>,
    /// Block rules still raised by the fixed text.
    pub residual: Vec<&'static str>,
    pub warnings: Vec<Finding>,
}

impl Blocked {
    /// Ids of every rule that blocks the post, unfixable first.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.violations
            .iter()
            .map(|f| f.rule_id)
            .chain(self.residual.iter().copied())
            .collect()
    }

    /// The message stored on a post that was refused at publish time.
    pub fn summary(&self) -> String {
        format!("Blocked by compliance rules: {}", self.rule_ids().join(", "))
    }
}

impl From<Blocked> for AppError {
    fn from(blocked: Blocked) -> Self {
        AppError::UnprocessableEntity {
            message: REJECTION_REASON.to_string(),
            details: serde_json::to_value(&blocked).unwrap_or_default(),
        }
    }
}

/// Evaluate a post's fields; `Err` when they cannot be published.
pub fn check_post(title: &str, body: &str, hashtags: &str) -> Result<PostComplianceResult, Blocked> {
    let result = evaluate_post(title, body, hashtags);
    if result.is_resolved() {
        return Ok(result);
    }
    Err(Blocked {
        violations: result.unfixable,
        residual: result.residual,
        warnings: result.warnings,
    })
}

/// Refuse a batch when any of its posts is blocked, naming each one.
pub fn check_batch<'a>(posts: impl IntoIterator<Item = &'a PostRecord>) -> Result<(), AppError> {
    let blocked: Vec<serde_json::Value> = posts
        .into_iter()
        .filter_map(|p| {
            let blocked = check_post(&p.title, &p.body, &p.hashtags).err()?;
            Some(serde_json::json!({ "post_id": p.id, "rules": blocked.rule_ids() }))
        })
        .collect();
    if blocked.is_empty() {
        return Ok(());
    }
    Err(AppError::UnprocessableEntity {
        message: REJECTION_REASON.to_string(),
        details: serde_json::json!({ "blocked": blocked }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    const SEC_CLIENT: &str = "The SEC was our client for three years.";

    #[test]
    fn fixable_copy_passes_with_fixes() {
        let result = check_post("Launch", "Shipping today\u{2014}faster reviews.", "").unwrap();
        assert!(result.auto_fixed);
        assert!(!result.fixed.body.contains('\u{2014}'));
    }

    #[test]
    fn unfixable_copy_names_its_rules() {
        let blocked = check_post("Launch", SEC_CLIENT, "").unwrap_err();
        assert!(blocked.rule_ids().contains(&"sec-relationship"));
        assert!(blocked.summary().starts_with("Blocked by compliance rules: "));
        assert!(blocked.summary().contains("sec-relationship"));
    }

    #[test]
    fn blocked_becomes_compliance_rejection() {
        let blocked = check_post("Launch", SEC_CLIENT, "").unwrap_err();
        let response = AppError::from(blocked).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
