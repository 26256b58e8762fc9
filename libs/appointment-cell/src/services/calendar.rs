// libs/appointment-cell/src/services/calendar.rs
use chrono::{Datelike, NaiveDate};

use crate::models::{Appointment, AppointmentError};

/// True when at least one appointment starts on `day` (time of day ignored).
pub fn has_appointment_on(day: NaiveDate, appointments: &[Appointment]) -> bool {
    appointments.iter().any(|appointment| appointment.local_date() == day)
}

pub fn appointments_on(day: NaiveDate, appointments: &[Appointment]) -> impl Iterator<Item = &Appointment> {
    appointments
        .iter()
        .filter(move |appointment| appointment.local_date() == day)
}

/// Every day of the given month, in order.
pub fn month_days(year: i32, month: u32) -> Result<Vec<NaiveDate>, AppointmentError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppointmentError::InvalidDate(format!("{:04}-{:02}", year, month)))?;

    Ok(first
        .iter_days()
        .take_while(|day| day.month() == month)
        .collect())
}

/// Days of the month that should carry an appointment marker.
pub fn highlighted_days(
    year: i32,
    month: u32,
    appointments: &[Appointment],
) -> Result<Vec<NaiveDate>, AppointmentError> {
    Ok(month_days(year, month)?
        .into_iter()
        .filter(|day| has_appointment_on(*day, appointments))
        .collect())
}
