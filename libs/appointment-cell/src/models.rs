// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Length assumed for an appointment whose end time is unknown.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A normalised appointment snapshot. Start and end are absolute instants
/// carried in the practice's local offset so calendar days can be read off
/// directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub starts_at: DateTime<FixedOffset>,
    pub ends_at: Option<DateTime<FixedOffset>>,
    pub status: AppointmentStatus,
    pub mode: AppointmentMode,
    pub reminder_sent: bool,
    pub service_type: Option<String>,
    pub notes: Option<String>,
}

impl Appointment {
    pub fn starts_at_utc(&self) -> DateTime<Utc> {
        self.starts_at.with_timezone(&Utc)
    }

    /// End instant, falling back to the default session length.
    pub fn scheduled_end_time(&self) -> DateTime<FixedOffset> {
        self.ends_at
            .unwrap_or_else(|| self.starts_at + Duration::minutes(DEFAULT_DURATION_MINUTES))
    }

    pub fn duration_minutes(&self) -> i64 {
        match self.ends_at {
            Some(end) => (end - self.starts_at).num_minutes(),
            None => DEFAULT_DURATION_MINUTES,
        }
    }

    /// Calendar day of the start, in the offset the appointment was normalised to.
    pub fn local_date(&self) -> NaiveDate {
        self.starts_at.date_naive()
    }

    /// Minutes since local midnight at which the appointment starts.
    pub fn start_minute_of_day(&self) -> i64 {
        minute_of_day(self.starts_at.time())
    }

    pub fn end_minute_of_day(&self) -> i64 {
        minute_of_day(self.scheduled_end_time().time())
    }

    /// Upcoming iff the start is at or after `now`.
    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.starts_at >= now
    }
}

fn minute_of_day(time: NaiveTime) -> i64 {
    use chrono::Timelike;
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(alias = "upcoming")]
    Upcoming,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "cancelled", alias = "canceled")]
    Cancelled,
    #[serde(alias = "pending")]
    Pending,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Upcoming,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Pending,
    ];
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Upcoming => write!(f, "Upcoming"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
            AppointmentStatus::Pending => write!(f, "Pending"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(AppointmentStatus::Upcoming),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            "pending" => Ok(AppointmentStatus::Pending),
            _ => Err(AppointmentError::UnknownStatus(s.to_string())),
        }
    }
}

/// Delivery channel of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentMode {
    #[default]
    #[serde(alias = "in_person", alias = "inperson")]
    InPerson,
    #[serde(alias = "telehealth", alias = "tele_health", alias = "virtual")]
    TeleHealth,
}

impl fmt::Display for AppointmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentMode::InPerson => write!(f, "inPerson"),
            AppointmentMode::TeleHealth => write!(f, "teleHealth"),
        }
    }
}

impl FromStr for AppointmentMode {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(|c: char| c == '_' || c == '-', "").as_str() {
            "inperson" => Ok(AppointmentMode::InPerson),
            "telehealth" | "virtual" => Ok(AppointmentMode::TeleHealth),
            _ => Err(AppointmentError::UnknownMode(s.to_string())),
        }
    }
}

// ==============================================================================
// VIEW AND FILTER MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    #[default]
    Upcoming,
    History,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::Upcoming => write!(f, "upcoming"),
            ViewKind::History => write!(f, "history"),
        }
    }
}

impl FromStr for ViewKind {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(ViewKind::Upcoming),
            "history" => Ok(ViewKind::History),
            _ => Err(AppointmentError::UnknownView(s.to_string())),
        }
    }
}

/// `"All"` or a single status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Only(AppointmentStatus),
}

impl StatusFilter {
    pub fn accepts(&self, status: AppointmentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "All"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

impl TryFrom<String> for StatusFilter {
    type Error = AppointmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub view: ViewKind,
    pub status_filter: StatusFilter,
}

// ==============================================================================
// DERIVED PRESENTATION MODELS
// ==============================================================================

/// The single call-to-action shown for an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryCta {
    JoinCall,
    MarkArrived,
    PrepareRoom,
    SendReminder,
    ViewDetails,
}

impl PrimaryCta {
    pub fn label(&self) -> &'static str {
        match self {
            PrimaryCta::JoinCall => "Join Call",
            PrimaryCta::MarkArrived => "Mark Arrived",
            PrimaryCta::PrepareRoom => "Prepare Room",
            PrimaryCta::SendReminder => "Send Reminder",
            PrimaryCta::ViewDetails => "View Details",
        }
    }
}

impl fmt::Display for PrimaryCta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionUrgency {
    /// Start time reached or passed.
    Due,
    /// Five minutes or less to go.
    Imminent,
    Scheduled,
}

impl SessionUrgency {
    pub fn from_minutes(minutes_until: i64) -> Self {
        if minutes_until <= 0 {
            SessionUrgency::Due
        } else if minutes_until <= 5 {
            SessionUrgency::Imminent
        } else {
            SessionUrgency::Scheduled
        }
    }
}

/// Free stretch of the working day, in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGap {
    pub start: i64,
    pub end: i64,
}

impl ScheduleGap {
    pub fn length_minutes(&self) -> i64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakHour {
    pub label: String,
    pub start: i64,
    pub end: i64,
}

// ==============================================================================
// WIRE MODELS
// ==============================================================================

/// Appointment as delivered by the backend. `date` is either a full
/// timestamp or a `YYYY-MM-DD` date paired with `start_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub date: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub reminder_sent: Option<bool>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AppointmentRecord {
    /// Resolve the record to a single start instant in `offset`. Malformed
    /// records are rejected rather than repaired.
    pub fn normalize(&self, offset: FixedOffset) -> Result<Appointment, AppointmentError> {
        let date = self.date.trim();

        // Wall-clock times in the record are read in the timestamp's own
        // offset when it carries one, otherwise in the practice offset.
        let recorded = if date.contains('T') {
            parse_timestamp(date, offset)?
        } else {
            let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| AppointmentError::InvalidDate(self.date.clone()))?;
            let start = self
                .start_time
                .as_deref()
                .ok_or_else(|| AppointmentError::InvalidTime("missing start time".to_string()))?;
            localize(day.and_time(parse_time_of_day(start)?), offset)?
        };
        let starts_at = recorded.with_timezone(&offset);

        let ends_at = match self.end_time.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let end = localize(
                    recorded.date_naive().and_time(parse_time_of_day(raw)?),
                    *recorded.offset(),
                )?;
                if end < recorded {
                    return Err(AppointmentError::InvalidTimeRange {
                        start: recorded.format("%H:%M").to_string(),
                        end: raw.trim().to_string(),
                    });
                }
                Some(end.with_timezone(&offset))
            }
            _ => None,
        };

        let status = match self.status.as_deref() {
            Some(raw) => raw.parse()?,
            None => AppointmentStatus::Pending,
        };

        let mode = match self.mode.as_deref() {
            Some(raw) => raw.parse()?,
            None => AppointmentMode::default(),
        };

        Ok(Appointment {
            id: self.id,
            starts_at,
            ends_at,
            status,
            mode,
            reminder_sent: self.reminder_sent.unwrap_or(false),
            service_type: self.service_type.clone(),
            notes: self.notes.clone(),
        })
    }
}

/// Offset for a whole number of minutes east of UTC.
pub fn utc_offset(minutes: i32) -> Result<FixedOffset, AppointmentError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(AppointmentError::InvalidOffset(minutes))
}

fn parse_timestamp(raw: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>, AppointmentError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed);
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| AppointmentError::InvalidDate(raw.to_string()))
        .and_then(|naive| localize(naive, offset))
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime, AppointmentError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppointmentError::InvalidTime(raw.to_string()))
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> Result<DateTime<FixedOffset>, AppointmentError> {
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| AppointmentError::InvalidTime(naive.to_string()))
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AppointmentError {
    #[error("Invalid appointment date: {0}")]
    InvalidDate(String),

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Appointment ends ({end}) before it starts ({start})")]
    InvalidTimeRange { start: String, end: String },

    #[error("Unknown appointment status: {0}")]
    UnknownStatus(String),

    #[error("Unknown appointment mode: {0}")]
    UnknownMode(String),

    #[error("Unknown appointment view: {0}")]
    UnknownView(String),

    #[error("Unknown reporting range: {0}")]
    UnknownRange(String),

    #[error("UTC offset out of range: {0} minutes")]
    InvalidOffset(i32),
}

impl From<AppointmentError> for shared_models::AppError {
    fn from(err: AppointmentError) -> Self {
        shared_models::AppError::Validation(err.to_string())
    }
}
