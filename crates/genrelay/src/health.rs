//! Freshness checks a downstream consumer applies to a received payload.
//!
//! The relay itself never evaluates these; they are here so dashboards and
//! alert rules share one definition of "stale" and "overdue".

use crate::payload::GeneratorReading;
use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone};
use serde::Serialize;

/// Hours after which a missing update means the pipeline is broken.
pub const STALE_AFTER_HOURS: i64 = 25;

/// Days after which a missing self-test means an exercise cycle was skipped.
pub const EXERCISE_EVERY_DAYS: i64 = 8;

pub fn stale_after() -> TimeDelta {
    TimeDelta::hours(STALE_AFTER_HOURS)
}

pub fn exercise_every() -> TimeDelta {
    TimeDelta::days(EXERCISE_EVERY_DAYS)
}

/// True when `last_updated` is older than `threshold` at `now`.
pub fn is_stale<Tz: TimeZone>(
    last_updated: &DateTime<FixedOffset>,
    now: &DateTime<Tz>,
    threshold: TimeDelta,
) -> bool {
    now.fixed_offset() - *last_updated > threshold
}

/// True when the last exercise completed more than `threshold` before `now`.
pub fn is_exercise_overdue<Tz: TimeZone>(
    last_exercise: &DateTime<FixedOffset>,
    now: &DateTime<Tz>,
    threshold: TimeDelta,
) -> bool {
    now.fixed_offset() - *last_exercise > threshold
}

/// Both verdicts for one reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub stale: bool,
    pub exercise_overdue: bool,
    pub age_seconds: i64,
    pub since_exercise_seconds: i64,
}

/// Judge a reading with the default thresholds.
pub fn assess<Tz: TimeZone>(reading: &GeneratorReading, now: &DateTime<Tz>) -> HealthReport {
    let now = now.fixed_offset();
    HealthReport {
        stale: is_stale(&reading.last_updated, &now, stale_after()),
        exercise_overdue: is_exercise_overdue(&reading.last_exercise_date, &now, exercise_every()),
        age_seconds: (now - reading.last_updated).num_seconds(),
        since_exercise_seconds: (now - reading.last_exercise_date).num_seconds(),
    }
}
