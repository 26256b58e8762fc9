// libs/appointment-cell/src/services/schedule.rs
use tracing::debug;

use crate::models::{Appointment, PeakHour, ScheduleGap};

/// Minutes in the working day used for utilisation.
pub const WORKDAY_MINUTES: i64 = 720;

const PEAK_WINDOW_START_HOUR: i64 = 8;
const PEAK_WINDOW_BUCKETS: usize = 12;

/// Free stretches of at least `min_gap_minutes` between `start_hour` and
/// `end_hour`. Gaps are measured from the latest end seen so far, so
/// overlapping bookings never produce a phantom gap. Bookings are clipped to
/// the window and those entirely outside it are ignored.
pub fn find_gaps(
    appointments: &[Appointment],
    start_hour: u32,
    end_hour: u32,
    min_gap_minutes: i64,
) -> Vec<ScheduleGap> {
    let day_start = i64::from(start_hour) * 60;
    let day_end = i64::from(end_hour) * 60;

    let mut booked: Vec<(i64, i64)> = appointments
        .iter()
        .map(|appointment| {
            let start = appointment.start_minute_of_day();
            let length = (appointment.scheduled_end_time() - appointment.starts_at).num_minutes();
            (start, start + length)
        })
        .filter(|(start, end)| *end > day_start && *start < day_end)
        .map(|(start, end)| (start.max(day_start), end.min(day_end)))
        .collect();

    if booked.is_empty() {
        return vec![ScheduleGap { start: day_start, end: day_end }];
    }

    booked.sort_by_key(|(start, _)| *start);

    let mut gaps = Vec::new();
    let mut cursor = day_start;

    for (start, end) in booked {
        if start - cursor >= min_gap_minutes {
            gaps.push(ScheduleGap { start: cursor, end: start });
        }
        cursor = cursor.max(end);
    }

    if day_end - cursor >= min_gap_minutes {
        gaps.push(ScheduleGap { start: cursor, end: day_end });
    }

    debug!("Found {} gaps of at least {} minutes", gaps.len(), min_gap_minutes);
    gaps
}

/// Busiest hour between 08:00 and 20:00; ties go to the earliest hour.
pub fn peak_hour(appointments: &[Appointment]) -> Option<PeakHour> {
    let mut buckets = [0usize; PEAK_WINDOW_BUCKETS];

    for appointment in appointments {
        let offset = appointment.start_minute_of_day() - PEAK_WINDOW_START_HOUR * 60;
        if offset < 0 {
            continue;
        }
        if let Some(bucket) = buckets.get_mut((offset / 60) as usize) {
            *bucket += 1;
        }
    }

    let max = *buckets.iter().max()?;
    if max == 0 {
        return None;
    }

    let index = buckets.iter().position(|count| *count == max)? as i64;
    let hour = PEAK_WINDOW_START_HOUR + index;
    Some(PeakHour {
        label: format!("{}:00 - {}:00", hour, hour + 1),
        start: hour * 60,
        end: (hour + 1) * 60,
    })
}

pub fn total_minutes(appointments: &[Appointment]) -> i64 {
    appointments.iter().map(Appointment::duration_minutes).sum()
}

/// Booked share of the working day, rounded and capped at 100.
pub fn utilization_percent(appointments: &[Appointment]) -> u32 {
    let ratio = total_minutes(appointments) as f64 / WORKDAY_MINUTES as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentMode, AppointmentStatus};
    use chrono::{Duration, FixedOffset, TimeZone};
    use uuid::Uuid;

    fn booked(hour: u32, minute: u32, length: Option<i64>) -> Appointment {
        let offset = FixedOffset::east_opt(0).unwrap();
        let starts_at = offset.with_ymd_and_hms(2024, 6, 15, hour, minute, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            starts_at,
            ends_at: length.map(|minutes| starts_at + Duration::minutes(minutes)),
            status: AppointmentStatus::Upcoming,
            mode: AppointmentMode::InPerson,
            reminder_sent: false,
            service_type: None,
            notes: None,
        }
    }

    #[test]
    fn test_empty_day_is_one_gap() {
        assert_eq!(find_gaps(&[], 8, 20, 180), vec![ScheduleGap { start: 480, end: 1200 }]);
    }

    #[test]
    fn test_leading_middle_and_trailing_gaps() {
        let appointments = vec![booked(16, 0, Some(60)), booked(11, 0, Some(60))];

        let gaps = find_gaps(&appointments, 8, 20, 180);
        // Leading and trailing stretches are exactly 180 minutes and still count.
        assert_eq!(
            gaps,
            vec![
                ScheduleGap { start: 480, end: 660 },
                ScheduleGap { start: 720, end: 960 },
                ScheduleGap { start: 1020, end: 1200 },
            ]
        );

        let gaps = find_gaps(&appointments, 8, 20, 181);
        assert_eq!(gaps, vec![ScheduleGap { start: 720, end: 960 }]);
    }

    #[test]
    fn test_overlapping_bookings_do_not_open_gaps() {
        let appointments = vec![booked(9, 0, Some(300)), booked(10, 0, Some(30)), booked(14, 0, Some(60))];

        let gaps = find_gaps(&appointments, 8, 20, 60);
        assert_eq!(
            gaps,
            vec![
                ScheduleGap { start: 480, end: 540 },
                ScheduleGap { start: 900, end: 1200 },
            ]
        );
    }

    #[test]
    fn test_gaps_stay_inside_the_window() {
        let late = vec![booked(22, 0, Some(60))];
        assert_eq!(find_gaps(&late, 8, 20, 180), vec![ScheduleGap { start: 480, end: 1200 }]);

        // Early start and late finish are clipped to opening and closing time.
        let edges = vec![booked(7, 0, Some(120)), booked(19, 0, Some(120))];
        assert_eq!(find_gaps(&edges, 8, 20, 180), vec![ScheduleGap { start: 540, end: 1140 }]);

        let evening = vec![booked(16, 0, Some(60)), booked(21, 0, Some(60))];
        for gap in find_gaps(&evening, 8, 20, 60) {
            assert!(gap.start >= 480 && gap.end <= 1200, "{:?} escapes the window", gap);
        }
    }

    #[test]
    fn test_peak_hour_prefers_earliest_tie() {
        let appointments = vec![
            booked(9, 0, None),
            booked(9, 45, None),
            booked(13, 0, None),
            booked(13, 30, None),
            booked(7, 0, None),
        ];

        let peak = peak_hour(&appointments).unwrap();
        assert_eq!(peak.label, "9:00 - 10:00");
        assert_eq!((peak.start, peak.end), (540, 600));
    }

    #[test]
    fn test_peak_hour_outside_window_is_none() {
        assert_eq!(peak_hour(&[]), None);
        assert_eq!(peak_hour(&[booked(6, 0, None), booked(21, 0, None)]), None);
    }

    #[test]
    fn test_utilization_defaults_and_cap() {
        // Two sessions without an end count as an hour each.
        assert_eq!(utilization_percent(&[booked(9, 0, None), booked(10, 0, None)]), 17);
        assert_eq!(total_minutes(&[booked(9, 0, Some(45))]), 45);

        let packed: Vec<Appointment> = (8..20).map(|hour| booked(hour, 0, Some(90))).collect();
        assert_eq!(utilization_percent(&packed), 100);
        assert_eq!(utilization_percent(&[]), 0);
    }
}
