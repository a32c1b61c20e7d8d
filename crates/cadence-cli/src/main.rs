//! # cadence CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cadence_cli::check::{run_check, CheckArgs};
use cadence_cli::classify::{run_classify, ClassifyArgs};
use cadence_cli::rules::{run_rules, RulesArgs};
use cadence_cli::slots::{run_slots, SlotsArgs};

/// Cadence editorial tools.
///
/// Check copy against the house rules, inspect the rule catalogue,
/// classify content and preview scheduling slots without running the
/// service.
#[derive(Parser, Debug)]
#[command(name = "cadence", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check text or a post against the editorial rules.
    Check(CheckArgs),

    /// List the editorial rules.
    Rules(RulesArgs),

    /// Classify text into a content type.
    Classify(ClassifyArgs),

    /// Preview open posting slots.
    Slots(SlotsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Rules(args) => run_rules(args),
        Commands::Classify(args) => run_classify(args),
        Commands::Slots(args) => run_slots(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
