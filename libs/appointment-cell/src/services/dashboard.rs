// libs/appointment-cell/src/services/dashboard.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_config::DashboardConfig;

use crate::models::{
    utc_offset, Appointment, AppointmentError, AppointmentQuery, PeakHour, PrimaryCta, ScheduleGap,
    SessionUrgency,
};
use crate::services::calendar::{appointments_on, highlighted_days};
use crate::services::countdown::{minutes_until, session_label, time_remaining};
use crate::services::cta::select_primary_cta;
use crate::services::formatters::format_slot;
use crate::services::kpi::{kpi_report, KpiRange, KpiReport};
use crate::services::schedule::{find_gaps, peak_hour, utilization_percent};
use crate::services::suggestions::{gap_suggestions, next_appointment_suggestions, Suggestion};
use crate::services::view_filter::filter_appointments;

/// Check-in opens this long before the booked start.
pub const SESSION_LEAD_MINUTES: i64 = 5;

/// Records carry no client details.
const UNNAMED_CLIENT: &str = "your client";

/// Earliest appointment starting strictly after `now`.
pub fn next_upcoming(appointments: &[Appointment], now: DateTime<Utc>) -> Option<&Appointment> {
    appointments
        .iter()
        .filter(|appointment| appointment.starts_at > now)
        .min_by_key(|appointment| appointment.starts_at)
}

/// Appointment that finished most recently before `now`.
pub fn most_recent(appointments: &[Appointment], now: DateTime<Utc>) -> Option<&Appointment> {
    appointments
        .iter()
        .filter(|appointment| appointment.scheduled_end_time() < now)
        .max_by_key(|appointment| appointment.scheduled_end_time())
}

/// Whether `now` falls inside any session, counting the check-in lead time.
/// Both bounds are exclusive.
pub fn is_in_session(appointments: &[Appointment], now: DateTime<Utc>) -> bool {
    appointments.iter().any(|appointment| {
        let opens = appointment.starts_at - Duration::minutes(SESSION_LEAD_MINUTES);
        opens < now && now < appointment.scheduled_end_time()
    })
}

pub fn greeting(local_hour: u32) -> &'static str {
    match local_hour {
        0..=11 => "Good Morning",
        12..=17 => "Good Afternoon",
        _ => "Good Evening",
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAppointmentSummary {
    pub id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub slot: String,
    pub minutes_until: i64,
    pub countdown: String,
    pub session_label: String,
    pub urgency: SessionUrgency,
    pub primary_cta: PrimaryCta,
}

impl NextAppointmentSummary {
    pub fn new(appointment: &Appointment, now: DateTime<Utc>) -> Self {
        let starts_at = appointment.starts_at_utc();
        let minutes = minutes_until(starts_at, now);

        Self {
            id: appointment.id,
            starts_at,
            slot: format_slot(appointment),
            minutes_until: minutes,
            countdown: time_remaining(Some(starts_at), now).unwrap_or_default(),
            session_label: session_label(minutes),
            urgency: SessionUrgency::from_minutes(minutes),
            primary_cta: select_primary_cta(minutes, appointment.mode, appointment.reminder_sent),
        }
    }
}

/// Everything a dashboard render needs, derived from one sampled `now`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub greeting: String,
    pub query: AppointmentQuery,
    pub next_appointment: Option<NextAppointmentSummary>,
    pub in_session: bool,
    pub visible: Vec<Appointment>,
    pub highlighted_days: Vec<NaiveDate>,
    pub gaps: Vec<ScheduleGap>,
    pub peak_hour: Option<PeakHour>,
    pub utilization_percent: u32,
    pub kpi: KpiReport,
    pub suggestions: Vec<Suggestion>,
}

impl DashboardSnapshot {
    #[instrument(skip(appointments, config), fields(count = appointments.len()))]
    pub fn build(
        appointments: &[Appointment],
        now: DateTime<Utc>,
        query: AppointmentQuery,
        config: &DashboardConfig,
    ) -> Result<Self, AppointmentError> {
        let offset = utc_offset(config.utc_offset_minutes)?;
        let local_now = now.with_timezone(&offset);
        let today = local_now.date_naive();

        let todays: Vec<Appointment> = appointments_on(today, appointments).cloned().collect();

        let visible = filter_appointments(appointments.iter().cloned(), query, now);
        let highlighted = highlighted_days(today.year(), today.month(), appointments)?;

        debug!(
            "Snapshot for {}: {} visible, {} booked today",
            today,
            visible.len(),
            todays.len()
        );

        let gaps = find_gaps(
            &todays,
            config.timeline_start_hour,
            config.timeline_end_hour,
            config.min_gap_minutes,
        );
        let next = next_upcoming(appointments, now);

        let mut suggestions = gaps
            .first()
            .map(|gap| gap_suggestions(gap, &todays, today))
            .unwrap_or_default();
        if let Some(appointment) = next {
            suggestions.extend(next_appointment_suggestions(appointment, UNNAMED_CLIENT, now));
        }

        Ok(Self {
            generated_at: now,
            today,
            greeting: greeting(local_now.hour()).to_string(),
            query,
            next_appointment: next.map(|appointment| NextAppointmentSummary::new(appointment, now)),
            in_session: is_in_session(appointments, now),
            visible,
            highlighted_days: highlighted,
            gaps,
            peak_hour: peak_hour(&todays),
            utilization_percent: utilization_percent(&todays),
            kpi: kpi_report(appointments, KpiRange::Today, now, config)?,
            suggestions,
        })
    }
}
