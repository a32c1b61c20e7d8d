//! # cadence-schedule
//!
//! Posting-slot allocation. Everything here is pure: the current time is
//! a parameter, so results are reproducible.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`slots`] | Weekday peak-hour slot search and per-type day preference |
//! | [`narrative`] | Ordering validation and positional batch assignment |

pub mod narrative;
pub mod slots;

pub use narrative::{
    assign_batch, needs_ordering, resolve_order, validate_order, Assignment, AssignmentSource,
    NarrativeItem, OrderError, SINGLE_ITEM_REASON,
};
pub use slots::{
    assign_slot, available_slots, hour_bucket, preferred_weekdays, SlotConfig, SlotConfigError,
    MAX_HORIZON_DAYS, MAX_SLOTS, MAX_SLOTS_PER_DAY,
};
