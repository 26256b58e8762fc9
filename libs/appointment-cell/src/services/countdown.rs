// libs/appointment-cell/src/services/countdown.rs
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::trace;

/// Time left before an appointment starts, floored to whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Now,
    Remaining { hours: i64, minutes: i64 },
}

impl Countdown {
    pub fn between(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let diff = target - now;
        if diff <= Duration::zero() {
            return Countdown::Now;
        }

        let seconds = diff.num_seconds();
        Countdown::Remaining {
            hours: seconds / 3600,
            minutes: (seconds % 3600) / 60,
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Now => write!(f, "Now"),
            Countdown::Remaining { hours, minutes } if *hours > 0 => write!(f, "{}h {}m", hours, minutes),
            Countdown::Remaining { minutes, .. } => write!(f, "{}m", minutes),
        }
    }
}

/// Countdown text for `target`, or `None` when there is nothing to count down to.
pub fn time_remaining(target: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
    let target = target?;
    let countdown = Countdown::between(target, now);
    trace!("Countdown to {} at {}: {}", target, now, countdown);
    Some(countdown.to_string())
}

/// Whole minutes from `now` until `start`, truncated toward zero.
pub fn minutes_until(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (start - now).num_minutes()
}

/// Short badge text shown next to the next session.
pub fn session_label(minutes_until: i64) -> String {
    if minutes_until <= 0 {
        "Now".to_string()
    } else if minutes_until < 60 {
        format!("In {} min", minutes_until)
    } else {
        format!("In {}h", minutes_until / 60)
    }
}
