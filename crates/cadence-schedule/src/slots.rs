//! # Slot Search
//!
//! Generates open posting windows. Every slot:
//!
//! - falls on a weekday in the configured local offset,
//! - sits on one of the configured peak hours (local), stored as UTC,
//! - avoids every occupied hour bucket,
//! - shares its local date with at most one other slot.
//!
//! Output is chronological, duplicate-free, and never longer than
//! [`MAX_SLOTS`].

use std::collections::HashSet;

use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

use cadence_core::ContentType;

/// Slots emitted per local date.
pub const MAX_SLOTS_PER_DAY: usize = 2;

/// Slots emitted per call, whatever the horizon.
pub const MAX_SLOTS: usize = 60;

/// Longest accepted horizon. Longer requests are clamped.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Invalid slot configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotConfigError {
    #[error("peak hour {0} is outside 0..=23")]
    InvalidHour(u32),
    #[error("at least one peak hour is required")]
    NoPeakHours,
    #[error("UTC offset {0}h is outside -12..=14")]
    InvalidOffset(i32),
}

/// Parameters for slot generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub horizon_days: u32,
    /// Local clock hours, any order.
    pub peak_hours: Vec<u32>,
    /// Whole-hour offset of the audience's local time from UTC.
    pub utc_offset_hours: i32,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            peak_hours: vec![8, 9, 12],
            utc_offset_hours: -5,
        }
    }
}

impl SlotConfig {
    /// Validate and normalise a configuration. Peak hours are sorted and
    /// deduplicated; a horizon beyond [`MAX_HORIZON_DAYS`] is clamped.
    pub fn new(
        horizon_days: u32,
        peak_hours: Vec<u32>,
        utc_offset_hours: i32,
    ) -> Result<Self, SlotConfigError> {
        if let Some(&bad) = peak_hours.iter().find(|&&h| h > 23) {
            return Err(SlotConfigError::InvalidHour(bad));
        }
        if peak_hours.is_empty() {
            return Err(SlotConfigError::NoPeakHours);
        }
        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(SlotConfigError::InvalidOffset(utc_offset_hours));
        }
        let horizon = if horizon_days > MAX_HORIZON_DAYS {
            tracing::warn!(
                horizon_days,
                max = MAX_HORIZON_DAYS,
                "slot horizon clamped"
            );
            MAX_HORIZON_DAYS
        } else {
            horizon_days
        };
        let mut hours = peak_hours;
        hours.sort_unstable();
        hours.dedup();
        Ok(Self {
            horizon_days: horizon,
            peak_hours: hours,
            utc_offset_hours,
        })
    }

    /// The local offset as a chrono zone.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset()).date_naive()
    }

    /// Local weekday of an instant.
    pub fn local_weekday(&self, at: DateTime<Utc>) -> Weekday {
        at.with_timezone(&self.offset()).weekday()
    }
}

/// Truncate to the containing hour.
pub fn hour_bucket(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_minute(0))
        .unwrap_or(at)
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Open posting slots after `now`.
///
/// Scanning starts on the local day after `now` and covers
/// `config.horizon_days` days. Each emitted slot is added to the occupied
/// set immediately, so no call ever hands out the same hour twice.
pub fn available_slots(
    occupied: &[DateTime<Utc>],
    now: DateTime<Utc>,
    config: &SlotConfig,
) -> Vec<DateTime<Utc>> {
    let offset = config.offset();
    let mut taken: HashSet<DateTime<Utc>> = occupied.iter().copied().map(hour_bucket).collect();
    let mut hours = config.peak_hours.clone();
    hours.sort_unstable();
    hours.dedup();

    let today = config.local_date(now);
    let mut slots = Vec::new();

    for day in 1..=u64::from(config.horizon_days) {
        if slots.len() >= MAX_SLOTS {
            break;
        }
        let Some(date) = today.checked_add_days(Days::new(day)) else {
            break;
        };
        if is_weekend(date.weekday()) {
            continue;
        }
        let mut today_count = 0;
        for &hour in &hours {
            if today_count >= MAX_SLOTS_PER_DAY || slots.len() >= MAX_SLOTS {
                break;
            }
            let Some(local) = date.and_hms_opt(hour, 0, 0) else {
                continue;
            };
            let Some(slot) = offset.from_local_datetime(&local).single() else {
                continue;
            };
            let slot = slot.with_timezone(&Utc);
            if taken.insert(slot) {
                slots.push(slot);
                today_count += 1;
            }
        }
    }

    slots
}

/// Preferred publishing weekdays per content type.
pub fn preferred_weekdays(content_type: ContentType) -> &'static [Weekday] {
    use Weekday::*;
    match content_type {
        ContentType::ProductLaunch => &[Mon, Tue, Wed],
        ContentType::CaseStudy => &[Tue, Wed, Thu],
        ContentType::Vision => &[Fri],
        ContentType::Proof => &[Tue, Wed],
        ContentType::Insight => &[Wed, Thu],
        ContentType::Educational => &[Mon, Tue],
        ContentType::ThoughtLeadership => &[Tue, Wed, Thu],
        ContentType::General => &[Mon, Tue, Wed, Thu, Fri, Sat, Sun],
    }
}

/// Pick a slot for one item: the first candidate on a preferred weekday,
/// else the first candidate, else `None`.
pub fn assign_slot(
    content_type: ContentType,
    candidates: &[DateTime<Utc>],
    config: &SlotConfig,
) -> Option<DateTime<Utc>> {
    let preferred = preferred_weekdays(content_type);
    candidates
        .iter()
        .find(|slot| preferred.contains(&config.local_weekday(**slot)))
        .or_else(|| candidates.first())
        .copied()
}
