//! # cadence-compliance
//!
//! Pattern-based editorial compliance for post copy.
//!
//! ## Model
//!
//! The rule table ([`rules`]) is a fixed, ordered list. [`evaluate`] threads
//! a working copy of the text through it: warn rules record advisories,
//! block rules record violations, and block rules carrying a fix rewrite the
//! working copy before the next rule runs. A result passes when no block
//! rule without a fix fired.
//!
//! Everything here is synchronous and side-effect free. Callers may run
//! evaluations concurrently without coordination.
//!
//! ## Usage
//!
//! ```
//! let result = cadence_compliance::evaluate("Our 60% processing time reduction proves it.");
//! assert!(result.pass);
//! assert!(result.fixed_text.contains("[METRIC REMOVED]"));
//! ```

pub mod engine;
mod patterns;
pub mod rules;

pub use engine::{evaluate, evaluate_post, ComplianceResult, Finding, FixedPost, PostComplianceResult};
pub use rules::{catalogue, rule, rules, Rule, RuleAction, RuleDescriptor, Severity};
