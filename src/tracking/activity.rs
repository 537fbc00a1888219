use chrono::{DateTime, Utc};
use tracing::debug;

use super::{
    day_close::{aggregate, DayTotals},
    storage::entities::{
        duration_minutes, ActivityKind, ActivitySegmentEntity, OngoingActivityEntity, TrackerState,
    },
};

/// Closes the ongoing activity, if there's one, and moves it into the day log. Returns the closed
/// segment.
pub fn stop_activity(
    state: &mut TrackerState,
    now: DateTime<Utc>,
) -> Option<ActivitySegmentEntity> {
    let segment = state.current_activity.take()?.close(now);
    debug!("Closed {} segment {:?}", segment.kind, segment.name);
    state.daily_logs.push(segment.clone());
    Some(segment)
}

/// Starts a new activity. Whatever was running is stopped at the same instant, so consecutive
/// segments touch without a gap.
pub fn start_activity(
    state: &mut TrackerState,
    kind: ActivityKind,
    name: &str,
    now: DateTime<Utc>,
) {
    stop_activity(state, now);
    state.current_activity = Some(OngoingActivityEntity {
        kind,
        name: name.into(),
        start: now,
    });
}

/// Minutes of the day log plus the live part of the ongoing activity.
pub fn day_totals(state: &TrackerState, now: DateTime<Utc>) -> DayTotals {
    let mut totals = aggregate(&state.daily_logs);
    if let Some(ongoing) = &state.current_activity {
        totals.add(ongoing.kind, duration_minutes(ongoing.elapsed(now)));
    }
    totals
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::tracking::storage::entities::{ActivityKind, TrackerState};

    use super::{day_totals, start_activity, stop_activity};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 7, 4, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_stop_without_activity() {
        let mut state = TrackerState::default();

        assert!(stop_activity(&mut state, at(0)).is_none());
        assert_eq!(state, TrackerState::default());
    }

    #[test]
    fn test_start_switches_without_gap() {
        let mut state = TrackerState::default();

        start_activity(&mut state, ActivityKind::Project, "Admin", at(0));
        start_activity(&mut state, ActivityKind::Break, "Coffee / Lunch", at(45));
        start_activity(&mut state, ActivityKind::Project, "Main Project", at(60));
        stop_activity(&mut state, at(120));

        assert!(state.current_activity.is_none());
        assert_eq!(state.daily_logs.len(), 3);
        for pair in state.daily_logs.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for segment in &state.daily_logs {
            assert!(segment.end >= segment.start);
        }
        assert_eq!(&*state.daily_logs[1].name, "Coffee / Lunch");
    }

    #[test]
    fn test_start_is_stop_then_start() {
        let mut switched = TrackerState::default();
        start_activity(&mut switched, ActivityKind::Project, "Admin", at(0));
        start_activity(&mut switched, ActivityKind::Project, "Meeting", at(30));

        let mut explicit = TrackerState::default();
        start_activity(&mut explicit, ActivityKind::Project, "Admin", at(0));
        stop_activity(&mut explicit, at(30));
        start_activity(&mut explicit, ActivityKind::Project, "Meeting", at(30));

        assert_eq!(switched, explicit);
    }

    #[test]
    fn test_totals_include_ongoing() {
        let mut state = TrackerState::default();
        start_activity(&mut state, ActivityKind::Project, "Admin", at(0));
        start_activity(&mut state, ActivityKind::Break, "Coffee / Lunch", at(90));

        let totals = day_totals(&state, at(100));

        assert_eq!(totals.worked_minutes, 90.);
        assert_eq!(totals.break_minutes, 10.);
    }
}
