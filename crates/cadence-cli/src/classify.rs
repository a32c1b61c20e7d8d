//! # Classify Subcommand

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use cadence_core::{classify, ContentType};
use cadence_schedule::preferred_weekdays;

/// Arguments for the classify subcommand.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Text to classify.
    pub text: Option<String>,

    /// Read the text from a file; `-` reads stdin.
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Classification {
    content_type: ContentType,
    preferred_days: Vec<String>,
}

fn classification(text: &str) -> Classification {
    let content_type = classify(text);
    Classification {
        content_type,
        preferred_days: preferred_weekdays(content_type)
            .iter()
            .map(|d| d.to_string())
            .collect(),
    }
}

/// Execute the classify subcommand.
pub fn run_classify(args: &ClassifyArgs) -> Result<u8> {
    let text = crate::read_input(args.text.as_deref(), args.file.as_deref())?;
    let result = classification(&text);
    if args.json {
        crate::print_json(&result)?;
    } else {
        println!("{} (best days: {})", result.content_type, result.preferred_days.join(", "));
    }
    Ok(0)
}
