use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Projects every fresh state starts with.
pub const SEED_PROJECTS: [&str; 3] = ["Main Project", "Admin", "Meeting"];

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Copy)]
pub enum ActivityKind {
    Project,
    Break,
}

impl Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityKind::Project => write!(f, "Project"),
            ActivityKind::Break => write!(f, "Break"),
        }
    }
}

/// The activity currently being timed. It has no end until it's stopped, at which point it
/// becomes a [ActivitySegmentEntity] in the day log.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct OngoingActivityEntity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub name: Arc<str>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
}

impl OngoingActivityEntity {
    /// Time passed since the activity started. Never negative, even if the clock went backwards.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.start).max(Duration::zero())
    }

    /// Closes the activity at `end`. The end is clamped to the start so a segment can't have a
    /// negative duration.
    pub fn close(self, end: DateTime<Utc>) -> ActivitySegmentEntity {
        ActivitySegmentEntity {
            kind: self.kind,
            name: self.name,
            start: self.start,
            end: end.max(self.start),
        }
    }
}

/// A completed activity of the current day.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct ActivitySegmentEntity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub name: Arc<str>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

impl ActivitySegmentEntity {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Duration in fractional minutes. Nothing gets truncated here, rounding only happens once the
    /// day is closed.
    pub fn minutes(&self) -> f64 {
        duration_minutes(self.duration())
    }
}

pub fn duration_minutes(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.
}

/// Outcome of closing a single day. Kept in the state as a flat history list.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DaySummaryEntity {
    pub date: NaiveDate,
    pub worked_minutes: f64,
    pub break_minutes: f64,
    pub break_shortfall_minutes: f64,
    pub net_worked_minutes: f64,
    pub target_minutes: i64,
    pub delta_minutes: i64,
}

/// Everything that is persisted. Any field missing from a stored blob falls back to the value
/// from [Default], which gives a shallow merge of the stored state onto the defaults.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerState {
    pub total_balance_minutes: i64,
    pub projects: Vec<String>,
    pub current_activity: Option<OngoingActivityEntity>,
    pub daily_logs: Vec<ActivitySegmentEntity>,
    pub last_log_date: Option<NaiveDate>,
    pub current_project: Option<String>,
    pub history: Vec<DaySummaryEntity>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            total_balance_minutes: 0,
            projects: SEED_PROJECTS.iter().map(|v| v.to_string()).collect(),
            current_activity: None,
            daily_logs: vec![],
            last_log_date: None,
            current_project: None,
            history: vec![],
        }
    }
}

impl TrackerState {
    /// Whether the day log holds anything that a day close would account for.
    pub fn has_day_activity(&self) -> bool {
        !self.daily_logs.is_empty() || self.current_activity.is_some()
    }
}
