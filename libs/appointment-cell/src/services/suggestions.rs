// libs/appointment-cell/src/services/suggestions.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Appointment, ScheduleGap};
use crate::services::countdown::minutes_until;

const ADMIN_WINDOW_MINUTES: i64 = 120;
const BREAK_AFTER_SESSIONS: usize = 3;
const REMINDER_LEAD_MINUTES: i64 = 60;
const PREPARE_LEAD_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuggestedAction {
    BlockAdminTime,
    TakeBreak,
    SendReminder,
    PrepareRoom,
    GreetClient,
}

impl SuggestedAction {
    pub fn label(&self) -> &'static str {
        match self {
            SuggestedAction::BlockAdminTime => "Block Admin Time",
            SuggestedAction::TakeBreak => "Take a 15-min Break",
            SuggestedAction::SendReminder => "Send Reminder",
            SuggestedAction::PrepareRoom => "Prepare Room",
            SuggestedAction::GreetClient => "Greet Client",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub text: String,
    pub actions: Vec<SuggestedAction>,
}

/// Nudges for a free stretch of the day.
pub fn gap_suggestions(gap: &ScheduleGap, appointments: &[Appointment], today: NaiveDate) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    let length = gap.length_minutes();
    if length >= ADMIN_WINDOW_MINUTES {
        suggestions.push(Suggestion {
            text: format!("Looks like you have a {}-minute window, a good time for admin work", length),
            actions: vec![SuggestedAction::BlockAdminTime],
        });
    }

    let sessions_today = appointments
        .iter()
        .filter(|appointment| appointment.local_date() == today)
        .count();
    if sessions_today >= BREAK_AFTER_SESSIONS {
        suggestions.push(Suggestion {
            text: format!("You've had {} sessions, consider a quick break", sessions_today),
            actions: vec![SuggestedAction::TakeBreak],
        });
    }

    suggestions
}

/// Nudges leading up to the next session. At exactly fifteen minutes both the
/// room and the greeting are suggested.
pub fn next_appointment_suggestions(
    appointment: &Appointment,
    client_name: &str,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    let minutes = minutes_until(appointment.starts_at_utc(), now);
    let mut suggestions = Vec::new();

    if minutes >= REMINDER_LEAD_MINUTES {
        suggestions.push(Suggestion {
            text: format!(
                "Your session with {} is in {} minutes, send a reminder?",
                client_name, minutes
            ),
            actions: vec![SuggestedAction::SendReminder],
        });
    }

    if (PREPARE_LEAD_MINUTES..REMINDER_LEAD_MINUTES).contains(&minutes) {
        suggestions.push(Suggestion {
            text: format!(
                "You have {} minutes before {} arrives, time to prepare the room",
                minutes, client_name
            ),
            actions: vec![SuggestedAction::PrepareRoom],
        });
    }

    if minutes > 0 && minutes <= PREPARE_LEAD_MINUTES {
        suggestions.push(Suggestion {
            text: format!("{} arrives in {} minutes, get ready to greet them", client_name, minutes),
            actions: vec![SuggestedAction::GreetClient],
        });
    }

    suggestions
}
