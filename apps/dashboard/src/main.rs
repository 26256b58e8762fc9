use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod loader;

use appointment_cell::models::Appointment;
use appointment_cell::services::automation::AUTOMATION_INTERVAL_SECONDS;
use appointment_cell::services::calendar::appointments_on;
use appointment_cell::services::dashboard::next_upcoming;
use appointment_cell::services::{evaluate_status, CountdownTicker, DashboardSnapshot, PresenceState};
use shared_config::DashboardConfig;
use shared_utils::{Clock, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Harmonia dashboard");

    let config = DashboardConfig::from_env();
    let offset = loader::practice_offset(&config).map_err(|e| e.logged())?;
    let query = loader::query_from_env().map_err(|e| e.logged())?;
    let mut presence = PresenceState {
        status: loader::presence_from_env().map_err(|e| e.logged())?,
        custom_status: None,
    };

    let report = loader::load_appointments(&config.appointments_file, offset)
        .map_err(|e| {
            if e.is_input_error() {
                warn!("{} is not a valid appointment export", config.appointments_file);
            }
            e.logged()
        })
        .with_context(|| format!("loading {}", config.appointments_file))?;
    let appointments = report.accepted;

    // One `now` per render pass.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let now = clock.now();
    let snapshot = DashboardSnapshot::build(&appointments, now, query, &config)?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    let target = snapshot.next_appointment.as_ref().map(|next| next.starts_at);
    let mut ticker = CountdownTicker::from_config(target, Arc::clone(&clock), &config);
    if !ticker.is_active() {
        info!("No upcoming appointments, nothing to count down");
    }

    let mut automation = interval(Duration::from_secs(AUTOMATION_INTERVAL_SECONDS));
    automation.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut updates = ticker.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    warn!("Countdown channel closed");
                    break;
                }
                let Some(text) = updates.borrow_and_update().clone() else {
                    info!("Countdown stopped");
                    continue;
                };
                info!("Next session: {}", text);

                if text == "Now" {
                    let next = next_upcoming(&appointments, clock.now()).map(Appointment::starts_at_utc);
                    ticker.retarget(next);
                    if !ticker.is_active() {
                        info!("Last session of the roster has started");
                    }
                }
            }
            _ = automation.tick() => {
                let now = clock.now();
                let today = now.with_timezone(&offset).date_naive();
                let todays: Vec<Appointment> = appointments_on(today, &appointments).cloned().collect();

                let evaluation = evaluate_status(&todays, now, offset, presence.status, &[]);
                let next = evaluation.resolve(&presence);
                if next != presence {
                    info!(
                        "Presence {} ({})",
                        next.status,
                        next.custom_status.as_deref().unwrap_or("-")
                    );
                    presence = next;
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
        }
    }

    ticker.cancel();
    Ok(())
}
