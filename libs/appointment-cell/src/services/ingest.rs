// libs/appointment-cell/src/services/ingest.rs
use chrono::FixedOffset;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Appointment, AppointmentError, AppointmentRecord};

#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub id: Uuid,
    pub error: AppointmentError,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub accepted: Vec<Appointment>,
    pub rejected: Vec<RejectedRecord>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Normalise a batch from the backend. Bad records are dropped and reported;
/// good ones keep their input order.
pub fn normalize_records(records: &[AppointmentRecord], offset: FixedOffset) -> IngestReport {
    let mut report = IngestReport::default();

    for record in records {
        match record.normalize(offset) {
            Ok(appointment) => report.accepted.push(appointment),
            Err(error) => {
                warn!("Rejecting appointment {}: {}", record.id, error);
                report.rejected.push(RejectedRecord { id: record.id, error });
            }
        }
    }

    info!(
        "Normalised {} appointments ({} rejected)",
        report.accepted.len(),
        report.rejected.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn record(date: &str, start: &str) -> AppointmentRecord {
        AppointmentRecord {
            id: Uuid::new_v4(),
            date: date.to_string(),
            start_time: Some(start.to_string()),
            end_time: None,
            status: Some("Upcoming".to_string()),
            mode: None,
            reminder_sent: None,
            service_type: None,
            notes: Some("bring referral".to_string()),
        }
    }

    #[test]
    fn test_bad_records_are_reported_not_repaired() {
        let records = vec![
            record("2024-06-15", "09:00"),
            record("2024-06-31", "09:00"),
            record("2024-06-16", "10:30"),
        ];
        let offset = FixedOffset::east_opt(0).unwrap();

        let report = normalize_records(&records, offset);

        assert!(!report.is_clean());
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.accepted[0].id, records[0].id);
        assert_eq!(report.accepted[1].id, records[2].id);
        assert_eq!(report.accepted[0].notes.as_deref(), Some("bring referral"));

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].id, records[1].id);
        assert_matches!(report.rejected[0].error, AppointmentError::InvalidDate(_));
    }

    #[test]
    fn test_empty_batch_is_clean() {
        let report = normalize_records(&[], FixedOffset::east_opt(0).unwrap());
        assert!(report.is_clean());
        assert!(report.accepted.is_empty());
    }
}
