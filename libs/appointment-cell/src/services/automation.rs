// libs/appointment-cell/src/services/automation.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::models::{Appointment, AppointmentError};

/// Re-evaluation period of the status rules, in seconds.
pub const AUTOMATION_INTERVAL_SECONDS: u64 = 60;

const BACK_TO_BACK_SLACK_MINUTES: i64 = 10;
const BACK_TO_BACK_RUN: usize = 3;

// ==============================================================================
// PRESENCE MODELS
// ==============================================================================

/// Practitioner presence shown on the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PresenceStatus {
    #[default]
    Available,
    Busy,
    Offline,
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceStatus::Available => write!(f, "Available"),
            PresenceStatus::Busy => write!(f, "Busy"),
            PresenceStatus::Offline => write!(f, "Offline"),
        }
    }
}

impl FromStr for PresenceStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(PresenceStatus::Available),
            "busy" => Ok(PresenceStatus::Busy),
            "offline" => Ok(PresenceStatus::Offline),
            _ => Err(AppointmentError::UnknownStatus(s.to_string())),
        }
    }
}

/// Presence plus the free-text status line under it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceState {
    pub status: PresenceStatus,
    pub custom_status: Option<String>,
}

impl PresenceState {
    pub fn apply(&mut self, effect: &StatusEffect) {
        match effect {
            StatusEffect::SetStatus(status) => self.status = *status,
            StatusEffect::SetCustomStatus(text) => self.custom_status = Some(text.clone()),
        }
    }
}

/// A status the practitioner booked ahead of time; active strictly between
/// `from` and `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledStatus {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub status: String,
}

impl ScheduledStatus {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.from < now && now < self.to
    }
}

// ==============================================================================
// RULES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerKind {
    TimeOfDay,
    NoAppointments,
    BackToBackAppointments,
    LongBusy,
    EndOfDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum StatusEffect {
    SetStatus(PresenceStatus),
    SetCustomStatus(String),
}

/// Inputs every rule sees. `now` is in the practice offset so hour and
/// weekday checks read local wall-clock time.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub now: DateTime<FixedOffset>,
    pub appointments: &'a [Appointment],
    pub current_status: PresenceStatus,
}

impl RuleContext<'_> {
    fn all_start_after(&self, instant: DateTime<FixedOffset>) -> bool {
        self.appointments.iter().all(|appointment| appointment.starts_at > instant)
    }
}

#[derive(Clone, Copy)]
pub struct StatusRule {
    pub id: &'static str,
    pub trigger: TriggerKind,
    pub description: &'static str,
    pub condition: fn(&RuleContext<'_>) -> bool,
    pub effect: fn() -> StatusEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub rule_id: &'static str,
    pub effect: StatusEffect,
}

fn custom(text: &str) -> StatusEffect {
    StatusEffect::SetCustomStatus(text.to_string())
}

fn lunch_break(ctx: &RuleContext<'_>) -> bool {
    ctx.now.hour() == 12 && ctx.all_start_after(ctx.now)
}

fn no_appointment_admin(ctx: &RuleContext<'_>) -> bool {
    ctx.all_start_after(ctx.now + Duration::hours(2))
}

fn back_to_back(ctx: &RuleContext<'_>) -> bool {
    let mut remaining: Vec<&Appointment> = ctx
        .appointments
        .iter()
        .filter(|appointment| appointment.scheduled_end_time() > ctx.now)
        .collect();
    remaining.sort_by_key(|appointment| appointment.starts_at);

    let mut run = 1;
    for pair in remaining.windows(2) {
        let slack = (pair[1].starts_at - pair[0].scheduled_end_time()).num_minutes();
        if slack <= BACK_TO_BACK_SLACK_MINUTES {
            run += 1;
            if run >= BACK_TO_BACK_RUN {
                return true;
            }
        } else {
            run = 1;
        }
    }
    false
}

fn long_busy(ctx: &RuleContext<'_>) -> bool {
    if ctx.current_status != PresenceStatus::Busy {
        return false;
    }
    let three_hours_ago = ctx.now - Duration::hours(3);
    ctx.appointments.iter().any(|appointment| {
        appointment.starts_at < ctx.now && appointment.scheduled_end_time() > three_hours_ago
    })
}

fn end_of_day(ctx: &RuleContext<'_>) -> bool {
    ctx.now.hour() >= 19
        && ctx
            .appointments
            .iter()
            .all(|appointment| appointment.scheduled_end_time() < ctx.now)
}

fn focus_morning(ctx: &RuleContext<'_>) -> bool {
    (8..10).contains(&ctx.now.hour()) && ctx.all_start_after(ctx.now)
}

fn afternoon_admin(ctx: &RuleContext<'_>) -> bool {
    ctx.now.hour() == 15 && ctx.all_start_after(ctx.now + Duration::hours(1))
}

fn early_start(ctx: &RuleContext<'_>) -> bool {
    (6..8).contains(&ctx.now.hour())
}

fn post_lunch(ctx: &RuleContext<'_>) -> bool {
    ctx.now.hour() == 13
}

fn long_gap(ctx: &RuleContext<'_>) -> bool {
    let mut upcoming: Vec<DateTime<FixedOffset>> = ctx
        .appointments
        .iter()
        .map(|appointment| appointment.starts_at)
        .filter(|start| *start > ctx.now)
        .collect();
    upcoming.sort();

    match upcoming.as_slice() {
        [first, second, ..] => (*second - *first).num_hours() >= 3,
        _ => false,
    }
}

fn friday_wrap_up(ctx: &RuleContext<'_>) -> bool {
    ctx.now.weekday() == Weekday::Fri && ctx.now.hour() >= 15
}

/// Built-in rules in evaluation order. Later effects win.
pub fn default_rules() -> Vec<StatusRule> {
    vec![
        StatusRule {
            id: "lunch-break",
            trigger: TriggerKind::TimeOfDay,
            description: "Lunch break at noon when no session has started",
            condition: lunch_break,
            effect: || custom("Lunch break"),
        },
        StatusRule {
            id: "no-appointment-admin",
            trigger: TriggerKind::NoAppointments,
            description: "Admin block when nothing starts in the next two hours",
            condition: no_appointment_admin,
            effect: || custom("Admin block"),
        },
        StatusRule {
            id: "back-to-back-warning",
            trigger: TriggerKind::BackToBackAppointments,
            description: "Three or more remaining sessions at most ten minutes apart",
            condition: back_to_back,
            effect: || custom("Back-to-back sessions"),
        },
        StatusRule {
            id: "long-busy-stretch",
            trigger: TriggerKind::LongBusy,
            description: "Busy with a session running within the last three hours",
            condition: long_busy,
            effect: || custom("Take a break soon"),
        },
        StatusRule {
            id: "end-of-day",
            trigger: TriggerKind::EndOfDay,
            description: "Go offline after 19:00 once every session has ended",
            condition: end_of_day,
            effect: || StatusEffect::SetStatus(PresenceStatus::Offline),
        },
        StatusRule {
            id: "focus-morning",
            trigger: TriggerKind::TimeOfDay,
            description: "Focus time between 08:00 and 10:00 before the first session",
            condition: focus_morning,
            effect: || custom("Focus time"),
        },
        StatusRule {
            id: "afternoon-admin",
            trigger: TriggerKind::TimeOfDay,
            description: "Admin block at 15:00 with a free hour ahead",
            condition: afternoon_admin,
            effect: || custom("Admin block"),
        },
        StatusRule {
            id: "early-start-focus",
            trigger: TriggerKind::TimeOfDay,
            description: "Early focus time before 08:00",
            condition: early_start,
            effect: || custom("Early focus time"),
        },
        StatusRule {
            id: "post-lunch-energize",
            trigger: TriggerKind::TimeOfDay,
            description: "Quick reset during the 13:00 hour",
            condition: post_lunch,
            effect: || custom("Quick reset"),
        },
        StatusRule {
            id: "long-gap-strategy",
            trigger: TriggerKind::NoAppointments,
            description: "Strategy session when the next two sessions are three hours apart",
            condition: long_gap,
            effect: || custom("Strategy session"),
        },
        StatusRule {
            id: "friday-wrap-up",
            trigger: TriggerKind::TimeOfDay,
            description: "Weekly review on Friday afternoons",
            condition: friday_wrap_up,
            effect: || custom("Weekly review"),
        },
    ]
}

/// Effects of every rule whose condition holds, in rule order.
pub fn run_status_rules(rules: &[StatusRule], ctx: &RuleContext<'_>) -> Vec<StatusChange> {
    rules
        .iter()
        .filter(|rule| (rule.condition)(ctx))
        .map(|rule| {
            trace!(rule = rule.id, trigger = ?rule.trigger, "{}", rule.description);
            StatusChange {
                rule_id: rule.id,
                effect: (rule.effect)(),
            }
        })
        .collect()
}

/// Outcome of one automation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvaluation {
    pub scheduled: Option<String>,
    pub changes: Vec<StatusChange>,
}

impl StatusEvaluation {
    /// Presence after applying the scheduled status, then each rule effect.
    pub fn resolve(&self, current: &PresenceState) -> PresenceState {
        let mut next = current.clone();
        if let Some(text) = &self.scheduled {
            next.custom_status = Some(text.clone());
        }
        for change in &self.changes {
            next.apply(&change.effect);
        }
        next
    }
}

/// One pass of the status automation: the first active scheduled status,
/// followed by the built-in rules.
#[instrument(skip(appointments, scheduled), fields(count = appointments.len()))]
pub fn evaluate_status(
    appointments: &[Appointment],
    now: DateTime<Utc>,
    offset: FixedOffset,
    current_status: PresenceStatus,
    scheduled: &[ScheduledStatus],
) -> StatusEvaluation {
    let scheduled = scheduled
        .iter()
        .find(|entry| entry.is_active_at(now))
        .map(|entry| entry.status.clone());

    let ctx = RuleContext {
        now: now.with_timezone(&offset),
        appointments,
        current_status,
    };
    let changes = run_status_rules(&default_rules(), &ctx);

    debug!(
        "Status automation at {}: scheduled {:?}, {} rules fired",
        ctx.now,
        scheduled,
        changes.len()
    );

    StatusEvaluation { scheduled, changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentMode, AppointmentStatus};
    use chrono::TimeZone;
    use uuid::Uuid;

    // 2024-06-14 is a Friday, 2024-06-12 a Wednesday.
    fn session(day: u32, hour: u32, minute: u32, length: i64) -> Appointment {
        let offset = FixedOffset::east_opt(0).unwrap();
        let starts_at = offset.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap();
        Appointment {
            id: Uuid::new_v4(),
            starts_at,
            ends_at: Some(starts_at + Duration::minutes(length)),
            status: AppointmentStatus::Upcoming,
            mode: AppointmentMode::InPerson,
            reminder_sent: false,
            service_type: None,
            notes: None,
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
    }

    fn fired(appointments: &[Appointment], now: DateTime<Utc>, status: PresenceStatus) -> Vec<&'static str> {
        let utc = FixedOffset::east_opt(0).unwrap();
        evaluate_status(appointments, now, utc, status, &[])
            .changes
            .into_iter()
            .map(|change| change.rule_id)
            .collect()
    }

    #[test]
    fn test_lunch_break_only_before_any_session_starts() {
        let later = vec![session(12, 14, 30, 50)];
        assert!(fired(&later, at(12, 12, 10), PresenceStatus::Available).contains(&"lunch-break"));

        let started = vec![session(12, 11, 30, 50), session(12, 14, 30, 50)];
        assert!(!fired(&started, at(12, 12, 10), PresenceStatus::Available).contains(&"lunch-break"));
    }

    #[test]
    fn test_back_to_back_needs_three_close_sessions() {
        let tight = vec![
            session(12, 14, 0, 50),
            session(12, 15, 0, 50),
            session(12, 16, 0, 50),
        ];
        assert!(fired(&tight, at(12, 11, 0), PresenceStatus::Available).contains(&"back-to-back-warning"));

        let spread = vec![
            session(12, 14, 0, 50),
            session(12, 15, 0, 50),
            session(12, 17, 0, 50),
        ];
        assert!(!fired(&spread, at(12, 11, 0), PresenceStatus::Available).contains(&"back-to-back-warning"));

        // Sessions already over no longer count.
        assert!(!fired(&tight, at(12, 15, 55), PresenceStatus::Available).contains(&"back-to-back-warning"));
    }

    #[test]
    fn test_long_busy_depends_on_current_status() {
        let appointments = vec![session(12, 11, 0, 120)];
        assert!(fired(&appointments, at(12, 12, 0), PresenceStatus::Busy).contains(&"long-busy-stretch"));
        assert!(!fired(&appointments, at(12, 12, 0), PresenceStatus::Available).contains(&"long-busy-stretch"));
    }

    #[test]
    fn test_end_of_day_goes_offline() {
        let appointments = vec![session(12, 17, 0, 60)];
        let evaluation = evaluate_status(
            &appointments,
            at(12, 19, 30),
            FixedOffset::east_opt(0).unwrap(),
            PresenceStatus::Available,
            &[],
        );

        let state = evaluation.resolve(&PresenceState::default());
        assert_eq!(state.status, PresenceStatus::Offline);
        assert_eq!(state.custom_status, None);
        assert_eq!(
            evaluation.changes,
            vec![StatusChange {
                rule_id: "end-of-day",
                effect: StatusEffect::SetStatus(PresenceStatus::Offline),
            }]
        );
    }

    #[test]
    fn test_friday_afternoon_and_long_gap() {
        let appointments = vec![session(14, 16, 0, 50), session(14, 19, 30, 50)];
        let rules = fired(&appointments, at(14, 15, 10), PresenceStatus::Available);

        assert!(rules.contains(&"friday-wrap-up"));
        assert!(rules.contains(&"long-gap-strategy"));
        assert!(!rules.contains(&"afternoon-admin"));
        assert!(!fired(&appointments, at(12, 15, 10), PresenceStatus::Available).contains(&"friday-wrap-up"));
    }

    #[test]
    fn test_hours_are_read_in_practice_offset() {
        // 05:30 UTC is 07:30 two hours east: early focus, not nothing.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let evaluation = evaluate_status(&[], at(12, 5, 30), plus_two, PresenceStatus::Available, &[]);
        let rules: Vec<_> = evaluation.changes.iter().map(|change| change.rule_id).collect();
        assert_eq!(rules, vec!["no-appointment-admin", "early-start-focus"]);
    }

    #[test]
    fn test_scheduled_status_applies_first() {
        let scheduled = vec![
            ScheduledStatus {
                from: at(12, 9, 0),
                to: at(12, 11, 0),
                status: "Supervision".to_string(),
            },
            ScheduledStatus {
                from: at(12, 10, 0),
                to: at(12, 12, 0),
                status: "Training".to_string(),
            },
        ];
        let appointments = vec![session(12, 10, 45, 50)];
        let evaluation = evaluate_status(
            &appointments,
            at(12, 10, 30),
            FixedOffset::east_opt(0).unwrap(),
            PresenceStatus::Busy,
            &scheduled,
        );

        assert_eq!(evaluation.scheduled.as_deref(), Some("Supervision"));
        assert!(evaluation.changes.is_empty());
        let state = evaluation.resolve(&PresenceState {
            status: PresenceStatus::Busy,
            custom_status: None,
        });
        assert_eq!(state.custom_status.as_deref(), Some("Supervision"));
        assert_eq!(state.status, PresenceStatus::Busy);

        // Bounds are exclusive.
        assert!(!scheduled[0].is_active_at(at(12, 9, 0)));
    }

    #[test]
    fn test_rule_ids_are_unique() {
        let rules = default_rules();
        let mut ids: Vec<_> = rules.iter().map(|rule| rule.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
        assert_eq!(
            rules.iter().filter(|rule| rule.trigger == TriggerKind::TimeOfDay).count(),
            6
        );
    }

    #[test]
    fn test_presence_status_parsing() {
        assert_eq!("busy".parse::<PresenceStatus>().unwrap(), PresenceStatus::Busy);
        assert!("Away".parse::<PresenceStatus>().is_err());
        assert_eq!(PresenceStatus::Offline.to_string(), "Offline");
    }
}
