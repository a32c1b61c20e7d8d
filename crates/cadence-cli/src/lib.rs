//! # cadence-cli
//!
//! Offline tools over the Cadence domain crates. Nothing here talks to the
//! API service or a database.
//!
//! ## Subcommands
//!
//! - `check`: run the editorial rules over text or a post
//! - `rules`: list the rule catalogue
//! - `classify`: report the content type of some text
//! - `slots`: preview open posting slots
//!
//! Each handler returns an exit code: 0 on success, 1 when the checked
//! content fails. Operational errors propagate as `anyhow::Error`.

pub mod check;
pub mod classify;
pub mod rules;
pub mod slots;

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Resolve the text operand of a subcommand.
///
/// Inline text wins over `--file`. A file path of `-` reads stdin.
pub fn read_input(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) if path == Path::new("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        (None, None) => bail!("no input: pass TEXT or --file"),
    }
}

/// Print a value as pretty JSON.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
