//! Owner of the tracked state. [Tracker] is the only way state gets mutated: every operation
//! changes the in-memory state and then persists it as a whole through [StateStorage].

use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use day_close::{aggregate, reconcile, DayTotals};
use storage::{
    entities::{ActivityKind, ActivitySegmentEntity, DaySummaryEntity, TrackerState},
    state_storage::{load_state, save_state, StateStorage},
};
use tracing::{debug, info, instrument, warn};

use crate::utils::{clock::Clock, time::local_date};

pub mod activity;
pub mod day_close;
pub mod storage;

/// Label used for breaks when the user doesn't name them.
pub const DEFAULT_BREAK_LABEL: &str = "Coffee / Lunch";

/// Result of a manual balance override.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BalanceUpdate {
    Updated(i64),
    /// Input wasn't an integer. Nothing was changed or saved.
    Rejected,
}

pub struct Tracker<S: StateStorage> {
    state: TrackerState,
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: StateStorage> Tracker<S> {
    /// Loads the stored state without modifying it.
    pub async fn load(storage: S, clock: Box<dyn Clock>) -> Result<Self> {
        let state = load_state(&storage).await?;
        Ok(Self {
            state,
            storage,
            clock,
        })
    }

    /// Loads the stored state and closes the previous day if the date changed since the last run.
    /// Returns the summary of the closed day, if one was closed.
    pub async fn open(
        storage: S,
        clock: Box<dyn Clock>,
    ) -> Result<(Self, Option<DaySummaryEntity>)> {
        let mut tracker = Self::load(storage, clock).await?;
        let summary = tracker.roll_over().await?;
        Ok((tracker, summary))
    }

    #[instrument(skip(self))]
    async fn roll_over(&mut self) -> Result<Option<DaySummaryEntity>> {
        let now = self.clock.time();
        let today = local_date(now);
        if self.state.last_log_date == Some(today) {
            return Ok(None);
        }

        let summary = if self.state.has_day_activity() {
            // Logged under the stale date, measured against the target of today.
            let stale_day = self.state.last_log_date.unwrap_or(today);
            info!("Closing stale day {stale_day}");
            Some(self.close_day_inner(stale_day, now))
        } else {
            None
        };

        self.state.daily_logs.clear();
        self.state.last_log_date = Some(today);
        self.save().await?;
        Ok(summary)
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.time()
    }

    /// Worked and break minutes of today, including the running activity.
    pub fn day_totals(&self) -> DayTotals {
        activity::day_totals(&self.state, self.now())
    }

    /// Project used when the user starts work without naming one.
    pub fn default_project(&self) -> Option<&str> {
        self.state
            .current_project
            .as_deref()
            .or_else(|| self.state.projects.first().map(String::as_str))
    }

    #[instrument(skip(self))]
    pub async fn start(&mut self, kind: ActivityKind, name: &str) -> Result<()> {
        let now = self.now();
        activity::start_activity(&mut self.state, kind, name, now);
        info!("Started {kind} {name:?}");
        self.save().await
    }

    /// Stops the running activity. Doing so with nothing running changes nothing.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<Option<ActivitySegmentEntity>> {
        let now = self.now();
        let Some(segment) = activity::stop_activity(&mut self.state, now) else {
            debug!("Nothing to stop");
            return Ok(None);
        };
        self.save().await?;
        Ok(Some(segment))
    }

    /// Closes the current day and applies its delta to the balance.
    #[instrument(skip(self))]
    pub async fn close_day(&mut self) -> Result<DaySummaryEntity> {
        let now = self.now();
        let summary = self.close_day_inner(local_date(now), now);
        self.save().await?;
        Ok(summary)
    }

    /// Stops whatever runs at `now` and records the log as `date`. The target is the one of the
    /// weekday `now` falls on.
    fn close_day_inner(&mut self, date: NaiveDate, now: DateTime<Utc>) -> DaySummaryEntity {
        activity::stop_activity(&mut self.state, now);
        let closed_on = local_date(now).weekday();
        let summary = reconcile(date, closed_on, aggregate(&self.state.daily_logs));
        self.state.total_balance_minutes += summary.delta_minutes;
        self.state.daily_logs.clear();
        self.state.history.push(summary.clone());
        info!(
            "Closed {date}: net worked {:.1}, target {}, delta {}",
            summary.net_worked_minutes, summary.target_minutes, summary.delta_minutes
        );
        summary
    }

    /// Adds a project. Blank names and names that are already registered are ignored.
    #[instrument(skip(self))]
    pub async fn add_project(&mut self, name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || self.state.projects.iter().any(|v| v == name) {
            debug!("Ignoring project {name:?}");
            return Ok(false);
        }
        self.state.projects.push(name.to_string());
        self.save().await?;
        Ok(true)
    }

    /// Replaces the balance with `input` if it is an integer amount of minutes.
    #[instrument(skip(self))]
    pub async fn set_balance(&mut self, input: &str) -> Result<BalanceUpdate> {
        let Ok(minutes) = input.trim().parse::<i64>() else {
            warn!("Rejected balance {input:?}");
            return Ok(BalanceUpdate::Rejected);
        };
        self.state.total_balance_minutes = minutes;
        self.save().await?;
        Ok(BalanceUpdate::Updated(minutes))
    }

    /// Makes `name` the current project. If something is being tracked, tracking continues on the
    /// selected project from now on. Unknown projects are ignored.
    #[instrument(skip(self))]
    pub async fn select_project(&mut self, name: &str) -> Result<bool> {
        if !self.state.projects.iter().any(|v| v == name) {
            debug!("Unknown project {name:?}");
            return Ok(false);
        }
        self.state.current_project = Some(name.to_string());
        if self.state.current_activity.is_some() {
            let now = self.now();
            activity::start_activity(&mut self.state, ActivityKind::Project, name, now);
        }
        self.save().await?;
        Ok(true)
    }

    async fn save(&self) -> Result<()> {
        save_state(&self.storage, &self.state).await
    }
}
