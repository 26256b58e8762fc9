pub mod automation;
pub mod calendar;
pub mod countdown;
pub mod cta;
pub mod dashboard;
pub mod formatters;
pub mod ingest;
pub mod kpi;
pub mod schedule;
pub mod suggestions;
pub mod ticker;
pub mod view_filter;

pub use automation::{
    default_rules, evaluate_status, run_status_rules, PresenceState, PresenceStatus, ScheduledStatus,
    StatusEvaluation,
};
pub use calendar::{has_appointment_on, highlighted_days, month_days};
pub use countdown::{minutes_until, session_label, time_remaining, Countdown};
pub use cta::{primary_cta_for, select_primary_cta};
pub use dashboard::{DashboardSnapshot, NextAppointmentSummary};
pub use formatters::{format_slot, format_status};
pub use ingest::{normalize_records, IngestReport, RejectedRecord};
pub use kpi::{kpi_report, kpi_window, KpiRange, KpiReport};
pub use suggestions::{gap_suggestions, next_appointment_suggestions, SuggestedAction, Suggestion};
pub use ticker::CountdownTicker;
pub use view_filter::{filter_appointments, partition_by_time};
