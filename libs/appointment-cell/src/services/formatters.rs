// libs/appointment-cell/src/services/formatters.rs
use crate::models::Appointment;

/// Upper-case the first character, leave the rest alone.
pub fn format_status(status: Option<&str>) -> String {
    let Some(status) = status else {
        return String::new();
    };

    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `MM/DD/YYYY, HH:MM - HH:MM` in the appointment's own offset.
pub fn format_slot(appointment: &Appointment) -> String {
    format!(
        "{}, {} - {}",
        appointment.starts_at.format("%m/%d/%Y"),
        appointment.starts_at.format("%H:%M"),
        appointment.scheduled_end_time().format("%H:%M"),
    )
}
