// libs/appointment-cell/src/services/kpi.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use shared_config::DashboardConfig;

use crate::models::{utc_offset, Appointment, AppointmentError, AppointmentStatus, ScheduleGap};
use crate::services::schedule::{find_gaps, utilization_percent};

/// Reporting period of the KPI widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KpiRange {
    #[default]
    #[serde(rename = "Today")]
    Today,
    #[serde(rename = "This Week")]
    ThisWeek,
    #[serde(rename = "This Month")]
    ThisMonth,
}

impl fmt::Display for KpiRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiRange::Today => write!(f, "Today"),
            KpiRange::ThisWeek => write!(f, "This Week"),
            KpiRange::ThisMonth => write!(f, "This Month"),
        }
    }
}

impl FromStr for KpiRange {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        match key.as_str() {
            "today" | "day" => Ok(KpiRange::Today),
            "thisweek" | "week" => Ok(KpiRange::ThisWeek),
            "thismonth" | "month" => Ok(KpiRange::ThisMonth),
            _ => Err(AppointmentError::UnknownRange(s.to_string())),
        }
    }
}

/// Current period `[start, end)` and the previous one `[previous_start, previous_end]`,
/// where `previous_end` is one minute before `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub previous_start: DateTime<FixedOffset>,
    pub previous_end: DateTime<FixedOffset>,
}

impl KpiWindow {
    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn previous_contains(&self, instant: DateTime<FixedOffset>) -> bool {
        self.previous_start <= instant && instant <= self.previous_end
    }
}

fn midnight(day: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>, AppointmentError> {
    day.and_hms_opt(0, 0, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .ok_or_else(|| AppointmentError::InvalidDate(day.to_string()))
}

/// Period boundaries around `now`. Weeks start on Sunday.
pub fn kpi_window(range: KpiRange, now: DateTime<FixedOffset>) -> Result<KpiWindow, AppointmentError> {
    let today = now.date_naive();
    let out_of_range = || AppointmentError::InvalidDate(today.to_string());

    let (start, previous_start, end) = match range {
        KpiRange::Today => (today, today - Duration::days(1), today + Duration::days(1)),
        KpiRange::ThisWeek => {
            let start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
            (start, start - Duration::days(7), start + Duration::days(7))
        }
        KpiRange::ThisMonth => {
            let start = today.with_day(1).ok_or_else(out_of_range)?;
            let previous = start.checked_sub_months(Months::new(1)).ok_or_else(out_of_range)?;
            let next = start.checked_add_months(Months::new(1)).ok_or_else(out_of_range)?;
            (start, previous, next)
        }
    };

    let offset = *now.offset();
    let start = midnight(start, offset)?;
    Ok(KpiWindow {
        start,
        end: midnight(end, offset)?,
        previous_start: midnight(previous_start, offset)?,
        previous_end: start - Duration::minutes(1),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiStats {
    pub sessions: usize,
    pub cancellations: usize,
    pub utilization_percent: u32,
    pub next_gap: Option<ScheduleGap>,
}

impl KpiStats {
    fn collect(appointments: &[&Appointment], config: &DashboardConfig) -> Self {
        let owned: Vec<Appointment> = appointments.iter().map(|appointment| (*appointment).clone()).collect();
        let count = |status: AppointmentStatus| owned.iter().filter(|a| a.status == status).count();

        Self {
            sessions: count(AppointmentStatus::Completed),
            cancellations: count(AppointmentStatus::Cancelled),
            utilization_percent: utilization_percent(&owned),
            next_gap: find_gaps(
                &owned,
                config.timeline_start_hour,
                config.timeline_end_hour,
                config.min_gap_minutes,
            )
            .into_iter()
            .next(),
        }
    }

    /// Whole hours of the first free stretch, e.g. `"3h"`, or `"None"`.
    pub fn next_gap_label(&self) -> String {
        match self.next_gap {
            Some(gap) => format!("{}h", gap.length_minutes() / 60),
            None => "None".to_string(),
        }
    }
}

/// Change against the previous period; positive means more than before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiTrends {
    pub sessions: i64,
    pub cancellations: i64,
    pub utilization: i64,
}

impl KpiTrends {
    fn between(current: &KpiStats, previous: &KpiStats) -> Self {
        Self {
            sessions: current.sessions as i64 - previous.sessions as i64,
            cancellations: current.cancellations as i64 - previous.cancellations as i64,
            utilization: i64::from(current.utilization_percent) - i64::from(previous.utilization_percent),
        }
    }

    pub fn utilization_label(&self) -> String {
        format!("{}%", self.utilization)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiReport {
    pub range: KpiRange,
    pub window: KpiWindow,
    pub current: KpiStats,
    pub previous: KpiStats,
    pub trends: KpiTrends,
}

/// Completed and cancelled counts, utilisation and first gap for `range`,
/// with deltas against the period before it.
#[instrument(skip(appointments, config), fields(count = appointments.len()))]
pub fn kpi_report(
    appointments: &[Appointment],
    range: KpiRange,
    now: DateTime<Utc>,
    config: &DashboardConfig,
) -> Result<KpiReport, AppointmentError> {
    let offset = utc_offset(config.utc_offset_minutes)?;
    let window = kpi_window(range, now.with_timezone(&offset))?;

    let (current, previous): (Vec<&Appointment>, Vec<&Appointment>) = (
        appointments.iter().filter(|a| window.contains(a.starts_at)).collect(),
        appointments.iter().filter(|a| window.previous_contains(a.starts_at)).collect(),
    );
    debug!(
        "KPI {}: {} in period, {} in previous period",
        range,
        current.len(),
        previous.len()
    );

    let current = KpiStats::collect(&current, config);
    let previous = KpiStats::collect(&previous, config);
    let trends = KpiTrends::between(&current, &previous);

    Ok(KpiReport {
        range,
        window,
        current,
        previous,
        trends,
    })
}
