use ansi_term::Colour;
use chrono::{DateTime, Datelike, Local, Utc};

use crate::{
    tracking::{
        activity::day_totals,
        day_close::target_minutes,
        storage::entities::{DaySummaryEntity, TrackerState},
    },
    utils::time::{format_balance, format_duration, format_minutes, local_date},
};

fn clock_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%H:%M").to_string()
}

/// Balance colored green when the user is ahead, red otherwise.
pub fn paint_balance(minutes: i64) -> String {
    let text = format_balance(minutes);
    if minutes >= 0 {
        Colour::Green.paint(text).to_string()
    } else {
        Colour::Red.paint(text).to_string()
    }
}

/// Overview of the current day: running balance, progress towards the target and the day log
/// with the ongoing activity at the end.
pub fn render_status(state: &TrackerState, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let today = local_date(now);
    let totals = day_totals(state, now);

    out.push_str(&format!(
        "DAY : {}\n",
        today.format("%A").to_string().to_uppercase()
    ));
    out.push_str(&format!(
        "Balance: {}\n",
        format_balance(state.total_balance_minutes)
    ));
    out.push_str(&format!(
        "Today: worked {} of {}, break {}\n",
        format_minutes(totals.worked_minutes),
        format_minutes(target_minutes(today.weekday()) as f64),
        format_minutes(totals.break_minutes),
    ));

    for segment in &state.daily_logs {
        out.push_str(&format!(
            "  {}: {}\t{} - {}\n",
            segment.kind,
            segment.name,
            clock_time(segment.start),
            clock_time(segment.end)
        ));
    }
    if let Some(ongoing) = &state.current_activity {
        out.push_str(&format!(
            "  {}: {}\t{} - ...\t({})\n",
            ongoing.kind,
            ongoing.name,
            clock_time(ongoing.start),
            format_duration(ongoing.elapsed(now))
        ));
    }
    out
}

pub fn render_summary(summary: &DaySummaryEntity) -> String {
    format!(
        "{}\tworked {} (break {}, shortfall {})\ttarget {}\tdelta {}",
        summary.date.format("%a %Y-%m-%d"),
        format_minutes(summary.net_worked_minutes),
        format_minutes(summary.break_minutes),
        format_minutes(summary.break_shortfall_minutes.ceil()),
        format_minutes(summary.target_minutes as f64),
        format_balance(summary.delta_minutes),
    )
}

pub fn render_projects(state: &TrackerState) -> String {
    let mut out = String::new();
    for project in &state.projects {
        let marker = if state.current_project.as_deref() == Some(project.as_str()) {
            '*'
        } else {
            ' '
        };
        out.push_str(&format!("{marker} {project}\n"));
    }
    out
}
