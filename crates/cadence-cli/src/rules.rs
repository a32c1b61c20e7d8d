//! # Rules Subcommand
//!
//! Lists the editorial rule catalogue in evaluation order.

use anyhow::{bail, Result};
use clap::Args;

use cadence_compliance::{catalogue, RuleDescriptor, Severity};

/// Arguments for the rules subcommand.
#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Show a single rule by id.
    #[arg(long)]
    pub id: Option<String>,

    /// Only rules that block publication.
    #[arg(long)]
    pub blocking: bool,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

fn select(args: &RulesArgs) -> Vec<RuleDescriptor> {
    catalogue()
        .into_iter()
        .filter(|r| args.id.as_deref().map_or(true, |id| r.id == id))
        .filter(|r| !args.blocking || r.severity == Severity::Block)
        .collect()
}

/// Execute the rules subcommand.
pub fn run_rules(args: &RulesArgs) -> Result<u8> {
    let selected = select(args);
    if let Some(id) = &args.id {
        if selected.is_empty() {
            bail!("unknown rule: {id}");
        }
    }

    if args.json {
        crate::print_json(&selected)?;
        return Ok(0);
    }

    let width = selected.iter().map(|r| r.id.len()).max().unwrap_or(0);
    for r in &selected {
        let severity = match r.severity {
            Severity::Block => "block",
            Severity::Warn => "warn",
        };
        println!("{:<width$}  {severity:<5}  {}", r.id, r.description);
        if let Some(hint) = r.hint {
            println!("{:<width$}         {hint}", "");
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RulesArgs {
        RulesArgs {
            id: None,
            blocking: false,
            json: false,
        }
    }

    #[test]
    fn lists_whole_catalogue_by_default() {
        assert_eq!(select(&args()).len(), catalogue().len());
    }

    #[test]
    fn filters_by_id_and_severity() {
        let one = select(&RulesArgs {
            id: Some("no-em-dash".into()),
            ..args()
        });
        assert_eq!(one.len(), 1);

        let blocking = select(&RulesArgs {
            blocking: true,
            ..args()
        });
        assert!(!blocking.is_empty());
        assert!(blocking.iter().all(|r| r.severity == Severity::Block));
    }

    #[test]
    fn unknown_id_is_an_error() {
        let err = run_rules(&RulesArgs {
            id: Some("no-such-rule".into()),
            ..args()
        })
        .unwrap_err();
        assert!(err.to_string().contains("no-such-rule"));
    }
}
