//! Invariants of the slot search over arbitrary clocks, occupancy and
//! configuration.

use std::collections::{HashMap, HashSet};

use cadence_schedule::{available_slots, hour_bucket, SlotConfig, MAX_SLOTS, MAX_SLOTS_PER_DAY};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..(400 * 24 * 60)).prop_map(|m| base() + Duration::minutes(m))
}

fn config() -> impl Strategy<Value = SlotConfig> {
    (
        0u32..120,
        prop::collection::vec(0u32..24, 1..6),
        -12i32..=14,
    )
        .prop_map(|(h, hours, off)| SlotConfig::new(h, hours, off).unwrap())
}

proptest! {
    #[test]
    fn slots_respect_every_constraint(
        now in instant(),
        occupied in prop::collection::vec(instant(), 0..40),
        cfg in config(),
    ) {
        let slots = available_slots(&occupied, now, &cfg);
        let taken: HashSet<_> = occupied.iter().copied().map(hour_bucket).collect();

        prop_assert!(slots.len() <= MAX_SLOTS);
        prop_assert!(slots.windows(2).all(|w| w[0] < w[1]));

        let mut per_day: HashMap<_, usize> = HashMap::new();
        for slot in &slots {
            let local = slot.with_timezone(&cfg.offset());
            prop_assert!(!matches!(local.weekday(), Weekday::Sat | Weekday::Sun));
            prop_assert!(cfg.peak_hours.contains(&local.hour()));
            prop_assert_eq!(local.minute(), 0);
            prop_assert!(!taken.contains(slot));
            prop_assert!(local.date_naive() > cfg.local_date(now));
            *per_day.entry(local.date_naive()).or_default() += 1;
        }
        prop_assert!(per_day.values().all(|&n| n <= MAX_SLOTS_PER_DAY));
    }

    #[test]
    fn occupying_returned_slots_yields_disjoint_batch(now in instant(), cfg in config()) {
        let first = available_slots(&[], now, &cfg);
        let second = available_slots(&first, now, &cfg);
        let first: HashSet<_> = first.into_iter().collect();
        prop_assert!(second.iter().all(|s| !first.contains(s)));
    }
}
