//! Reconciliation of a finished day into a balance delta.
//!
//! The rules are:
//!  - Worked time is the sum of all project segments, break time the sum of all break segments.
//!  - At least [MIN_BREAK_MINUTES] of break are mandatory. Whatever is missing from that is taken
//!    off the worked time, which never goes below zero.
//!  - The result is compared to the target of the weekday the day is closed on and rounded to
//!    whole minutes.

use chrono::{NaiveDate, Weekday};

use super::storage::entities::{ActivityKind, ActivitySegmentEntity, DaySummaryEntity};

pub const MIN_BREAK_MINUTES: f64 = 30.;

/// Minutes a person is expected to work on a given day.
pub fn target_minutes(weekday: Weekday) -> i64 {
    match weekday {
        Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu => 480,
        Weekday::Fri => 360,
        Weekday::Sat | Weekday::Sun => 0,
    }
}

/// Part of the mandatory break that wasn't taken.
pub fn break_shortfall(break_minutes: f64) -> f64 {
    (MIN_BREAK_MINUTES - break_minutes).max(0.)
}

/// Minutes split by kind. Used for closing a day as well as for displaying progress.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DayTotals {
    pub worked_minutes: f64,
    pub break_minutes: f64,
}

impl DayTotals {
    pub fn add(&mut self, kind: ActivityKind, minutes: f64) {
        match kind {
            ActivityKind::Project => self.worked_minutes += minutes,
            ActivityKind::Break => self.break_minutes += minutes,
        }
    }
}

pub fn aggregate<'a>(segments: impl IntoIterator<Item = &'a ActivitySegmentEntity>) -> DayTotals {
    let mut totals = DayTotals::default();
    for segment in segments {
        totals.add(segment.kind, segment.minutes());
    }
    totals
}

/// Computes the outcome of `date`, closed on a day falling on `closed_on`. The target follows
/// the weekday of closing, which differs from `date` when a stale day gets closed later.
/// Rounding is done once, on the final difference, half away from zero.
pub fn reconcile(date: NaiveDate, closed_on: Weekday, totals: DayTotals) -> DaySummaryEntity {
    let target = target_minutes(closed_on);
    let shortfall = break_shortfall(totals.break_minutes);
    let net_worked = (totals.worked_minutes - shortfall).max(0.);
    let delta = (net_worked - target as f64).round() as i64;

    DaySummaryEntity {
        date,
        worked_minutes: totals.worked_minutes,
        break_minutes: totals.break_minutes,
        break_shortfall_minutes: shortfall,
        net_worked_minutes: net_worked,
        target_minutes: target,
        delta_minutes: delta,
    }
}
