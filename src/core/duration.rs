use chrono::{DateTime, Duration, Utc};

const NOT_SPECIFIED: &str = "not specified";

pub fn format_duration(minutes: Option<i64>) -> String {
    let minutes = match minutes {
        Some(m) if m > 0 => m,
        _ => return NOT_SPECIFIED.to_string(),
    };

    if minutes < 60 {
        return plural(minutes, "minute");
    }

    let hours = minutes / 60;
    let rest = minutes % 60;

    if rest == 0 {
        plural(hours, "hour")
    } else {
        format!("{} and {}", plural(hours, "hour"), plural(rest, "minute"))
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

pub fn compute_end_time(
    activated_at: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
) -> Option<DateTime<Utc>> {
    let start = activated_at?;
    let minutes = duration_minutes?;
    start.checked_add_signed(Duration::try_minutes(minutes)?)
}

pub fn is_overdue(activated_at: Option<DateTime<Utc>>, duration_minutes: Option<i64>) -> bool {
    is_overdue_at(activated_at, duration_minutes, Utc::now())
}

pub fn is_overdue_at(
    activated_at: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
    now: DateTime<Utc>,
) -> bool {
    compute_end_time(activated_at, duration_minutes).is_some_and(|end| now > end)
}

pub fn remaining_minutes(
    activated_at: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
) -> Option<i64> {
    remaining_minutes_at(activated_at, duration_minutes, Utc::now())
}

/// Rounds up, so a window with 10 seconds left still reports 1 minute.
pub fn remaining_minutes_at(
    activated_at: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
    now: DateTime<Utc>,
) -> Option<i64> {
    let end = compute_end_time(activated_at, duration_minutes)?;
    let remaining_ms = end.signed_duration_since(now).num_milliseconds();

    if remaining_ms <= 0 {
        return Some(0);
    }

    Some((remaining_ms + 59_999) / 60_000)
}
