// libs/appointment-cell/src/services/view_filter.rs
use std::borrow::Borrow;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Appointment, AppointmentQuery, ViewKind};

/// Stable filter: keeps the appointments that fall in `query.view` relative to
/// `now` and match `query.status_filter`, in input order.
///
/// Works on owned values and on references alike, so an already filtered
/// `Vec<&Appointment>` can be filtered again.
pub fn filter_appointments<T, I>(appointments: I, query: AppointmentQuery, now: DateTime<Utc>) -> Vec<T>
where
    T: Borrow<Appointment>,
    I: IntoIterator<Item = T>,
{
    let filtered: Vec<T> = appointments
        .into_iter()
        .filter(|item| {
            let appointment: &Appointment = item.borrow();
            in_view(appointment, query.view, now) && query.status_filter.accepts(appointment.status)
        })
        .collect();

    debug!(
        "Filtered appointments for view {} / status {}: {} kept",
        query.view,
        query.status_filter,
        filtered.len()
    );

    filtered
}

/// Split into `(upcoming, history)` against a single `now`. Every input lands
/// in exactly one side.
pub fn partition_by_time<T, I>(appointments: I, now: DateTime<Utc>) -> (Vec<T>, Vec<T>)
where
    T: Borrow<Appointment>,
    I: IntoIterator<Item = T>,
{
    appointments
        .into_iter()
        .partition(|item| <T as Borrow<Appointment>>::borrow(item).is_upcoming_at(now))
}

fn in_view(appointment: &Appointment, view: ViewKind, now: DateTime<Utc>) -> bool {
    match view {
        ViewKind::Upcoming => appointment.is_upcoming_at(now),
        ViewKind::History => !appointment.is_upcoming_at(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentMode, AppointmentStatus, StatusFilter};
    use chrono::{FixedOffset, TimeZone};
    use uuid::Uuid;

    fn appointment(hour: u32, status: AppointmentStatus) -> Appointment {
        let offset = FixedOffset::east_opt(0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            starts_at: offset.with_ymd_and_hms(2024, 6, 15, hour, 0, 0).unwrap(),
            ends_at: None,
            status,
            mode: AppointmentMode::InPerson,
            reminder_sent: false,
            service_type: None,
            notes: None,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn query(view: ViewKind, status_filter: StatusFilter) -> AppointmentQuery {
        AppointmentQuery { view, status_filter }
    }

    #[test]
    fn test_upcoming_and_history_split_on_now() {
        let past = appointment(9, AppointmentStatus::Completed);
        let future = appointment(15, AppointmentStatus::Upcoming);
        let all = vec![past.clone(), future.clone()];

        let upcoming = filter_appointments(&all, query(ViewKind::Upcoming, StatusFilter::All), noon());
        assert_eq!(upcoming, vec![&future]);

        let history = filter_appointments(&all, query(ViewKind::History, StatusFilter::All), noon());
        assert_eq!(history, vec![&past]);
    }

    #[test]
    fn test_start_equal_to_now_is_upcoming() {
        let exact = appointment(12, AppointmentStatus::Upcoming);
        let all = vec![exact.clone()];

        assert_eq!(
            filter_appointments(&all, query(ViewKind::Upcoming, StatusFilter::All), noon()).len(),
            1
        );
        assert!(filter_appointments(&all, query(ViewKind::History, StatusFilter::All), noon()).is_empty());
    }

    #[test]
    fn test_status_filter_narrows_view() {
        let all = vec![
            appointment(13, AppointmentStatus::Upcoming),
            appointment(14, AppointmentStatus::Pending),
            appointment(15, AppointmentStatus::Upcoming),
            appointment(8, AppointmentStatus::Upcoming),
        ];

        let pending = filter_appointments(
            &all,
            query(ViewKind::Upcoming, StatusFilter::Only(AppointmentStatus::Pending)),
            noon(),
        );
        assert_eq!(pending, vec![&all[1]]);

        let upcoming_status = filter_appointments(
            &all,
            query(ViewKind::Upcoming, StatusFilter::Only(AppointmentStatus::Upcoming)),
            noon(),
        );
        assert_eq!(upcoming_status, vec![&all[0], &all[2]]);
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let none: Vec<Appointment> = Vec::new();
        assert!(filter_appointments(&none, AppointmentQuery::default(), noon()).is_empty());
    }

    #[test]
    fn test_refiltering_is_idempotent() {
        let all = vec![
            appointment(9, AppointmentStatus::Cancelled),
            appointment(10, AppointmentStatus::Completed),
            appointment(16, AppointmentStatus::Cancelled),
        ];
        let q = query(ViewKind::History, StatusFilter::Only(AppointmentStatus::Cancelled));

        let once = filter_appointments(&all, q, noon());
        let twice = filter_appointments(once.iter().copied(), q, noon());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_partition_covers_every_appointment_once() {
        let all: Vec<Appointment> = (6..20)
            .map(|hour| appointment(hour, AppointmentStatus::ALL[hour as usize % 4]))
            .collect();

        let (upcoming, history) = partition_by_time(&all, noon());
        assert_eq!(upcoming.len() + history.len(), all.len());
        assert!(upcoming.iter().all(|a| a.is_upcoming_at(noon())));
        assert!(history.iter().all(|a| !a.is_upcoming_at(noon())));
    }
}
