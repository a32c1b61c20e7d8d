//! # Check Subcommand
//!
//! Runs the editorial rules over a piece of text, or over a whole post when
//! `--title` or `--hashtags` is given. Exits 1 when the content cannot be
//! published as fixed.

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use cadence_compliance::{evaluate, evaluate_post, Finding};

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Text to check. Use --file for longer copy.
    pub text: Option<String>,

    /// Read the text (or post body) from a file; `-` reads stdin.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Post title. Switches to whole-post evaluation.
    #[arg(long)]
    pub title: Option<String>,

    /// Post hashtags. Switches to whole-post evaluation.
    #[arg(long)]
    pub hashtags: Option<String>,

    /// Print the fixed text after the findings.
    #[arg(long)]
    pub show_fixed: bool,

    /// Emit the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Summary shared by text and post results.
struct Report<'a> {
    pass: bool,
    resolved: bool,
    violations: &'a [Finding],
    warnings: &'a [Finding],
    residual: &'a [&'static str],
}

fn render(report: &Report<'_>) -> String {
    let mut out = String::new();
    let verdict = match (report.pass, report.resolved) {
        (true, true) => "PASS",
        (true, false) => "PASS (fixes conflict)",
        (false, _) => "FAIL",
    };
    let _ = writeln!(
        out,
        "{verdict}: {} violation(s), {} warning(s)",
        report.violations.len(),
        report.warnings.len()
    );
    for f in report.violations {
        let tag = if f.auto_fixable { "fixed" } else { "block" };
        let _ = writeln!(out, "  [{tag}] {}: {}", f.rule_id, f.description);
        if let Some(hint) = f.hint {
            let _ = writeln!(out, "          {hint}");
        }
    }
    for f in report.warnings {
        let _ = writeln!(out, "  [warn]  {}: {}", f.rule_id, f.description);
    }
    if !report.residual.is_empty() {
        let _ = writeln!(out, "  still raised after fixes: {}", report.residual.join(", "));
    }
    out
}

/// Execute the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let input = crate::read_input(args.text.as_deref(), args.file.as_deref())?;

    if args.title.is_some() || args.hashtags.is_some() {
        let title = args.title.as_deref().unwrap_or_default();
        let hashtags = args.hashtags.as_deref().unwrap_or_default();
        let result = evaluate_post(title, &input, hashtags);
        tracing::info!(pass = result.pass, auto_fixed = result.auto_fixed, "post evaluated");

        if args.json {
            crate::print_json(&result)?;
        } else {
            print!(
                "{}",
                render(&Report {
                    pass: result.pass,
                    resolved: result.is_resolved(),
                    violations: &result.violations,
                    warnings: &result.warnings,
                    residual: &result.residual,
                })
            );
            if args.show_fixed {
                println!("\ntitle: {}", result.fixed.title);
                println!("\n{}", result.fixed.body);
                println!("\n{}", result.fixed.hashtags);
            }
        }
        return Ok(if result.is_resolved() { 0 } else { 1 });
    }

    let result = evaluate(&input);
    tracing::info!(pass = result.pass, auto_fixed = result.auto_fixed, "text evaluated");

    if args.json {
        crate::print_json(&result)?;
    } else {
        print!(
            "{}",
            render(&Report {
                pass: result.pass,
                resolved: result.is_resolved(),
                violations: &result.violations,
                warnings: &result.warnings,
                residual: &result.residual,
            })
        );
        if args.show_fixed {
            println!("\n{}", result.fixed_text);
        }
    }
    Ok(if result.is_resolved() { 0 } else { 1 })
}
