//! # Evaluation
//!
//! [`evaluate`] folds the rule table over a working copy of the text.
//! Each step either leaves the accumulator untouched, records a warning,
//! records a blocking finding, or records a finding and rewrites the
//! working text. The result is a pure function of the input.
//!
//! After the fold, block rules are re-checked once against the fixed text.
//! Any block rule still firing that was not already reported as unfixable
//! lands in `residual`; this is how fix interactions surface. There is no
//! second fold.

use serde::Serialize;

use crate::rules::{rules, Rule, RuleAction, Severity};

/// A triggered rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub rule_id: &'static str,
    pub description: &'static str,
    pub hint: Option<&'static str>,
    pub auto_fixable: bool,
}

impl Finding {
    fn from_rule(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id,
            description: rule.description,
            hint: rule.hint,
            auto_fixable: rule.is_fixable(),
        }
    }
}

/// Outcome of evaluating one string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceResult {
    /// No unfixable block rule fired.
    pub pass: bool,
    /// Every block rule that fired, fixable or not, in rule order.
    pub violations: Vec<Finding>,
    pub warnings: Vec<Finding>,
    /// The subset of `violations` with no fix.
    pub unfixable: Vec<Finding>,
    /// The input with every applicable fix applied in rule order.
    pub fixed_text: String,
    pub auto_fixed: bool,
    /// Block rules the fixed text still raises beyond `unfixable`.
    pub residual: Vec<&'static str>,
}

impl ComplianceResult {
    fn clean(text: &str) -> Self {
        Self {
            pass: true,
            violations: Vec::new(),
            warnings: Vec::new(),
            unfixable: Vec::new(),
            fixed_text: text.to_string(),
            auto_fixed: false,
            residual: Vec::new(),
        }
    }

    /// Whether the fixed text can be used as-is.
    pub fn is_resolved(&self) -> bool {
        self.pass && self.residual.is_empty()
    }
}

#[derive(Debug)]
struct Accumulator {
    text: String,
    violations: Vec<Finding>,
    warnings: Vec<Finding>,
}

impl Accumulator {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            violations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn step(mut self, rule: &Rule) -> Self {
        if !rule.triggers(&self.text) {
            return self;
        }
        match rule.action() {
            RuleAction::Warn => self.warnings.push(Finding::from_rule(rule)),
            RuleAction::Block => self.violations.push(Finding::from_rule(rule)),
            RuleAction::Fix(fix) => {
                self.violations.push(Finding::from_rule(rule));
                self.text = fix(&self.text);
            }
        }
        self
    }

    fn finish(self) -> ComplianceResult {
        let unfixable: Vec<Finding> = self
            .violations
            .iter()
            .filter(|f| !f.auto_fixable)
            .cloned()
            .collect();
        let auto_fixed = self.violations.iter().any(|f| f.auto_fixable);
        let residual = residual_of(&self.text, &unfixable);
        ComplianceResult {
            pass: unfixable.is_empty(),
            violations: self.violations,
            warnings: self.warnings,
            unfixable,
            fixed_text: self.text,
            auto_fixed,
            residual,
        }
    }
}

/// Block rules firing on `text`, excluding those already reported.
fn residual_of(text: &str, already: &[Finding]) -> Vec<&'static str> {
    rules()
        .iter()
        .filter(|r| r.severity() == Severity::Block)
        .filter(|r| !already.iter().any(|f| f.rule_id == r.id))
        .filter(|r| r.triggers(text))
        .map(|r| r.id)
        .collect()
}

/// Evaluate one string against the full rule table.
///
/// Empty input passes with no findings.
pub fn evaluate(text: &str) -> ComplianceResult {
    if text.is_empty() {
        return ComplianceResult::clean(text);
    }
    rules()
        .iter()
        .fold(Accumulator::new(text), Accumulator::step)
        .finish()
}

/// Fixed copies of each post field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixedPost {
    pub title: String,
    pub body: String,
    pub hashtags: String,
}

/// Outcome of evaluating a whole post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostComplianceResult {
    pub pass: bool,
    /// Item-level findings from the joined `title\n\nbody\n\nhashtags` text.
    pub violations: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub unfixable: Vec<Finding>,
    /// Each field fixed independently.
    pub fixed: FixedPost,
    pub auto_fixed: bool,
    /// Block rules the re-joined fixed fields still raise beyond `unfixable`.
    pub residual: Vec<&'static str>,
}

impl PostComplianceResult {
    pub fn is_resolved(&self) -> bool {
        self.pass && self.residual.is_empty()
    }
}

fn join_fields(title: &str, body: &str, hashtags: &str) -> String {
    format!("{title}\n\n{body}\n\n{hashtags}")
}

/// Evaluate a post's fields.
///
/// Title, body and hashtags are each evaluated on their own and keep their
/// own fixed text. The joined text is evaluated as well so that claims
/// spanning fields are reported; its findings are the item-level ones.
pub fn evaluate_post(title: &str, body: &str, hashtags: &str) -> PostComplianceResult {
    let title_result = evaluate(title);
    let body_result = evaluate(body);
    let tags_result = evaluate(hashtags);
    let joined = evaluate(&join_fields(title, body, hashtags));

    let pass = joined.pass && title_result.pass && body_result.pass && tags_result.pass;
    let auto_fixed = joined.auto_fixed
        || title_result.auto_fixed
        || body_result.auto_fixed
        || tags_result.auto_fixed;

    let fixed = FixedPost {
        title: title_result.fixed_text,
        body: body_result.fixed_text,
        hashtags: tags_result.fixed_text,
    };
    let residual = residual_of(
        &join_fields(&fixed.title, &fixed.body, &fixed.hashtags),
        &joined.unfixable,
    );

    PostComplianceResult {
        pass,
        violations: joined.violations,
        warnings: joined.warnings,
        unfixable: joined.unfixable,
        fixed,
        auto_fixed,
        residual,
    }
}
