//! # Rule Table
//!
//! The ordered, immutable rule set. Each rule pairs a detector with one of
//! three actions (see [`RuleAction`]). Order matters: a fix applied by an
//! earlier rule is visible to every later rule.

use serde::{Deserialize, Serialize};

use crate::patterns;

/// How a triggered rule affects the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Hard stop unless auto-fixed.
    Block,
    /// Advisory only.
    Warn,
}

/// What happens when a rule's detector fires.
#[derive(Clone, Copy)]
pub enum RuleAction {
    /// Block, then rewrite the working text so later rules see the fix.
    Fix(fn(&str) -> String),
    /// Block; no mechanical rewrite exists.
    Block,
    /// Record a warning.
    Warn,
}

/// One editorial rule.
#[derive(Clone, Copy)]
pub struct Rule {
    pub id: &'static str,
    pub description: &'static str,
    pub hint: Option<&'static str>,
    detect: fn(&str) -> bool,
    action: RuleAction,
}

impl Rule {
    pub fn severity(&self) -> Severity {
        match self.action {
            RuleAction::Fix(_) | RuleAction::Block => Severity::Block,
            RuleAction::Warn => Severity::Warn,
        }
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }

    /// Whether a block rule carries a fix.
    pub fn is_fixable(&self) -> bool {
        matches!(self.action, RuleAction::Fix(_))
    }

    pub fn triggers(&self, text: &str) -> bool {
        (self.detect)(text)
    }

    /// The rule's fix applied to `text`, or `None` for rules without one.
    pub fn fix(&self, text: &str) -> Option<String> {
        match self.action {
            RuleAction::Fix(fix) => Some(fix(text)),
            RuleAction::Block | RuleAction::Warn => None,
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("severity", &self.severity())
            .field("fixable", &self.is_fixable())
            .finish()
    }
}

/// Read-only view of a rule for display. Detectors and fixes stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    pub id: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub hint: Option<&'static str>,
}

static RULES: [Rule; 13] = [
    Rule {
        id: "no-em-dash",
        description: "Em dashes, en dashes and double hyphens are banned in published copy",
        hint: Some("Use a colon, comma or full stop instead."),
        detect: patterns::has_dash,
        action: RuleAction::Fix(patterns::fix_dash),
    },
    Rule {
        id: "no-unverified-processing-claim",
        description: "The \"60% processing time reduction\" figure is unverified and permanently banned",
        hint: Some("This figure is unverified and may not be published."),
        detect: patterns::has_banned_metric,
        action: RuleAction::Fix(patterns::fix_banned_metric),
    },
    Rule {
        id: "unverified-percentage",
        description: "Percentage improvement claims need a cited source",
        hint: Some("Cite a source for the percentage or remove it."),
        detect: patterns::has_percent_claim,
        action: RuleAction::Warn,
    },
    Rule {
        id: "sec-relationship",
        description: "SEC may not be described as a direct client or engagement",
        hint: Some(
            "SEC was a subcontractor engagement. State the prime contractor or remove the reference.",
        ),
        detect: patterns::has_sec_direct,
        action: RuleAction::Block,
    },
    Rule {
        id: "doj-relationship",
        description: "DOJ may not be described as a direct or prime relationship",
        hint: Some("DOJ was subcontractor only. Name the prime contractor or restructure the claim."),
        detect: patterns::has_doj_direct,
        action: RuleAction::Block,
    },
    Rule {
        id: "dhs-relationship",
        description: "DHS may not be described as a direct client or engagement",
        hint: Some(
            "DHS work was through HHREF (subcontractor, 2004-2010). Reference HHREF as prime.",
        ),
        detect: patterns::has_dhs_direct,
        action: RuleAction::Block,
    },
    Rule {
        id: "gsa-mas-status",
        description: "GSA MAS may not be described as held, active or awarded",
        hint: Some("GSA MAS is in pursuit. Write \"GSA MAS (in pursuit)\" or remove the reference."),
        detect: patterns::has_gsa_mas_current,
        action: RuleAction::Block,
    },
    Rule {
        id: "insight-product-status",
        description: "BHT Insight may not be described as a current or available product",
        hint: Some(
            "BHT Insight is concept stage only. Write \"BHT Insight (in development)\" or omit.",
        ),
        detect: patterns::has_insight_current,
        action: RuleAction::Block,
    },
    Rule {
        id: "solution-noun",
        description: "\"Solution\" as a marketing noun is banned",
        hint: Some("Describe the work concretely instead of calling it a solution."),
        detect: patterns::has_solution_noun,
        action: RuleAction::Fix(patterns::fix_solution_noun),
    },
    Rule {
        id: "forward-as-current",
        description: "Roadmap capabilities must not read as current ones",
        hint: Some(
            "Verify this is a current capability, not a roadmap item. Add \"(anticipated)\" if forward-looking.",
        ),
        detect: patterns::has_forward_claim,
        action: RuleAction::Warn,
    },
    Rule {
        id: "unsourced-budget-figure",
        description: "Dollar figures need source attribution on the same line",
        hint: Some("Add source attribution (OMB, CBO, GAO, agency FY report) or remove the dollar figure."),
        detect: patterns::has_unsourced_figure,
        action: RuleAction::Warn,
    },
    Rule {
        id: "template-opener",
        description: "Cliché template openers",
        hint: Some(
            "Rewrite the opening; it reads like a template. Lead with a specific fact, claim, or question.",
        ),
        detect: patterns::has_template_opener,
        action: RuleAction::Warn,
    },
    Rule {
        id: "excited-filler",
        description: "\"We are excited/pleased/thrilled/proud\" is corporate template language",
        hint: Some("Delete the phrase and lead with the news."),
        detect: patterns::has_excited_filler,
        action: RuleAction::Fix(patterns::fix_excited_filler),
    },
];

/// Every rule in evaluation order.
pub fn rules() -> &'static [Rule] {
    &RULES
}

/// Look up a rule by id.
pub fn rule(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id == id)
}

/// The catalogue exposed for display.
pub fn catalogue() -> Vec<RuleDescriptor> {
    RULES
        .iter()
        .map(|r| RuleDescriptor {
            id: r.id,
            description: r.description,
            severity: r.severity(),
            hint: r.hint,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = rules().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), rules().len());
    }

    #[test]
    fn warn_rules_have_no_fix() {
        for r in rules().iter().filter(|r| r.severity() == Severity::Warn) {
            assert!(r.fix("anything").is_none(), "{} has a fix", r.id);
        }
    }

    #[test]
    fn every_rule_has_a_hint() {
        assert!(rules().iter().all(|r| r.hint.is_some()));
    }

    #[test]
    fn catalogue_preserves_order_and_severity() {
        let cat = catalogue();
        assert_eq!(cat.len(), 13);
        assert_eq!(cat[0].id, "no-em-dash");
        assert_eq!(cat[0].severity, Severity::Block);
        assert_eq!(cat[2].severity, Severity::Warn);
        assert_eq!(cat[12].id, "excited-filler");
    }

    #[test]
    fn catalogue_serializes_severity_lowercase() {
        let json = serde_json::to_value(&catalogue()[3]).unwrap();
        assert_eq!(json["severity"], "block");
        assert_eq!(json["id"], "sec-relationship");
    }

    #[test]
    fn lookup_by_id() {
        assert!(rule("solution-noun").unwrap().is_fixable());
        assert!(!rule("sec-relationship").unwrap().is_fixable());
        assert!(rule("nope").is_none());
    }
}
