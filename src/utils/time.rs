use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

/// Calendar day the user sees at `time`. Days always follow the local timezone.
pub fn local_date(time: DateTime<Utc>) -> NaiveDate {
    time.with_timezone(&Local).date_naive()
}

/// Formats a signed amount of minutes as `+h:mm` or `-h:mm`.
pub fn format_balance(minutes: i64) -> String {
    let sign = if minutes >= 0 { '+' } else { '-' };
    let minutes = minutes.unsigned_abs();
    format!("{sign}{}:{:02}", minutes / 60, minutes % 60)
}

/// Formats fractional minutes as `h:mm`, dropping the seconds.
pub fn format_minutes(minutes: f64) -> String {
    let minutes = minutes.max(0.) as u64;
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

pub fn format_duration(v: Duration) -> String {
    if v.num_hours() > 0 {
        format!(
            "{}h{}m{}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}
