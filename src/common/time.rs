use chrono::{DateTime, Duration, Local, NaiveDateTime, NaiveTime, Timelike};

/// Renders a message timestamp relative to `now` ("just now", "5 min ago",
/// "2 hr 10 min ago", "3 days ago").
///
/// Accepts RFC 3339, ISO local date-times with or without fractional
/// seconds and bare `HH:MM` wall-clock times. A bare time later than
/// `now` is taken to be from the previous day. Anything else is returned
/// unchanged.
pub fn relative_time(timestamp: &str, now: NaiveDateTime) -> String {
    let trimmed = timestamp.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let elapsed = match parse_timestamp(trimmed, now) {
        Some(then) => whole_minute(now).signed_duration_since(whole_minute(then)),
        None => return trimmed.to_string(),
    };

    describe(elapsed)
}

/// Same as [`relative_time`] against the local clock.
pub fn time_ago(timestamp: &str) -> String {
    relative_time(timestamp, Local::now().naive_local())
}

fn parse_timestamp(raw: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local).naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    let time = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()?;
    let today = now.date().and_time(time);
    if today > now {
        Some(today - Duration::days(1))
    } else {
        Some(today)
    }
}

// Only hours and minutes are compared; seconds never count.
fn whole_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|at| at.with_nanosecond(0))
        .unwrap_or(at)
}

fn describe(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes();
    if minutes <= 0 {
        return "just now".to_string();
    }

    let hours = minutes / 60;
    if hours == 0 {
        return format!("{minutes} min ago");
    }
    if hours < 24 {
        return format!("{hours} hr {} min ago", minutes % 60);
    }

    match hours / 24 {
        1 => "1 day ago".to_string(),
        days => format!("{days} days ago"),
    }
}
