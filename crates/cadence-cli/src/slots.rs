//! # Slots Subcommand
//!
//! Previews the open posting slots the scheduler would hand out, and which
//! one it would pick for a given content type.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use cadence_core::ContentType;
use cadence_schedule::{assign_slot, available_slots, SlotConfig};

/// Arguments for the slots subcommand.
#[derive(Args, Debug)]
pub struct SlotsArgs {
    /// Reference time (RFC 3339). Defaults to now.
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,

    /// Days to scan after the reference day.
    #[arg(long, default_value_t = 30)]
    pub horizon_days: u32,

    /// Local peak hours, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = [8, 9, 12])]
    pub peak_hours: Vec<u32>,

    /// Audience offset from UTC in whole hours.
    #[arg(long, default_value_t = -5, allow_hyphen_values = true)]
    pub utc_offset: i32,

    /// Instants already taken (RFC 3339). Repeatable.
    #[arg(long = "occupied")]
    pub occupied: Vec<DateTime<Utc>>,

    /// Mark the slot this content type would be assigned.
    #[arg(long = "type")]
    pub content_type: Option<ContentType>,

    /// Maximum slots to print.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SlotPreview {
    slots: Vec<DateTime<Utc>>,
    recommended: Option<DateTime<Utc>>,
}

fn preview(args: &SlotsArgs, now: DateTime<Utc>) -> Result<(SlotConfig, SlotPreview)> {
    let config = SlotConfig::new(args.horizon_days, args.peak_hours.clone(), args.utc_offset)?;
    let slots = available_slots(&args.occupied, now, &config);
    let recommended = args
        .content_type
        .and_then(|ct| assign_slot(ct, &slots, &config));
    let preview = SlotPreview {
        slots: slots.into_iter().take(args.limit).collect(),
        recommended,
    };
    Ok((config, preview))
}

/// Execute the slots subcommand.
pub fn run_slots(args: &SlotsArgs) -> Result<u8> {
    let now = args.from.unwrap_or_else(Utc::now);
    let (config, preview) = preview(args, now)?;
    tracing::debug!(?config, count = preview.slots.len(), "slots computed");

    if args.json {
        crate::print_json(&preview)?;
        return Ok(0);
    }

    if preview.slots.is_empty() {
        println!("no open slots in the next {} days", config.horizon_days);
        return Ok(0);
    }
    let offset = config.offset();
    for slot in &preview.slots {
        let local = slot.with_timezone(&offset);
        let mark = if Some(*slot) == preview.recommended { "  <- recommended" } else { "" };
        println!("{}  ({}){mark}", slot.to_rfc3339(), local.format("%a %Y-%m-%d %H:%M %:z"));
    }
    if let Some(rec) = preview.recommended {
        if !preview.slots.contains(&rec) {
            println!("recommended: {}", rec.to_rfc3339());
        }
    }
    Ok(0)
}
