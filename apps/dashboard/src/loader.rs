use std::env;
use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use tracing::{debug, warn};

use appointment_cell::models::{utc_offset, AppointmentQuery, AppointmentRecord};
use appointment_cell::services::{normalize_records, IngestReport, PresenceStatus};
use shared_config::DashboardConfig;
use shared_models::AppError;

/// The practice offset, reported as a configuration problem when out of range.
pub fn practice_offset(config: &DashboardConfig) -> Result<FixedOffset, AppError> {
    utc_offset(config.utc_offset_minutes)
        .map_err(|e| AppError::Config(format!("HARMONIA_UTC_OFFSET_MINUTES: {}", e)))
}

/// Read a backend export (a JSON array of appointment records) and normalise it.
pub fn load_appointments(path: impl AsRef<Path>, offset: FixedOffset) -> Result<IngestReport, AppError> {
    let path = path.as_ref();
    debug!("Loading appointments from {}", path.display());

    let raw = fs::read_to_string(path)?;
    let records: Vec<AppointmentRecord> = serde_json::from_str(&raw)?;
    let report = normalize_records(&records, offset);

    if !report.is_clean() {
        warn!(
            "{} of {} records in {} were rejected",
            report.rejected.len(),
            records.len(),
            path.display()
        );
    }

    Ok(report)
}

/// View and status filter selected through `HARMONIA_VIEW` / `HARMONIA_STATUS_FILTER`.
pub fn query_from_env() -> Result<AppointmentQuery, AppError> {
    let mut query = AppointmentQuery::default();

    if let Ok(view) = env::var("HARMONIA_VIEW") {
        query.view = view.parse()?;
    }
    if let Ok(filter) = env::var("HARMONIA_STATUS_FILTER") {
        query.status_filter = filter.parse()?;
    }

    Ok(query)
}

/// Presence the practitioner starts the session with, from `HARMONIA_PRESENCE`.
pub fn presence_from_env() -> Result<PresenceStatus, AppError> {
    match env::var("HARMONIA_PRESENCE") {
        Ok(raw) => Ok(raw.parse()?),
        Err(_) => Ok(PresenceStatus::default()),
    }
}
