// libs/appointment-cell/src/services/cta.rs
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Appointment, AppointmentMode, PrimaryCta};
use crate::services::countdown::minutes_until;

/// Within this many minutes the room should be made ready.
pub const PREPARE_ROOM_WINDOW_MINUTES: i64 = 15;

/// Within this many minutes an unsent reminder becomes the priority.
pub const REMINDER_WINDOW_MINUTES: i64 = 60;

/// Pick the call-to-action for a session. Rules are checked in order and the
/// first match wins.
pub fn select_primary_cta(minutes_until: i64, mode: AppointmentMode, reminder_sent: bool) -> PrimaryCta {
    if minutes_until <= 0 {
        return match mode {
            AppointmentMode::TeleHealth => PrimaryCta::JoinCall,
            AppointmentMode::InPerson => PrimaryCta::MarkArrived,
        };
    }

    if minutes_until <= PREPARE_ROOM_WINDOW_MINUTES {
        return PrimaryCta::PrepareRoom;
    }

    if minutes_until <= REMINDER_WINDOW_MINUTES && !reminder_sent {
        return PrimaryCta::SendReminder;
    }

    PrimaryCta::ViewDetails
}

pub fn primary_cta_for(appointment: &Appointment, now: DateTime<Utc>) -> PrimaryCta {
    let minutes = minutes_until(appointment.starts_at_utc(), now);
    let cta = select_primary_cta(minutes, appointment.mode, appointment.reminder_sent);
    debug!("Appointment {} is {} minutes out, primary action {:?}", appointment.id, minutes, cta);
    cta
}
