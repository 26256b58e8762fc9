// libs/appointment-cell/src/services/ticker.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, trace};

use shared_config::DashboardConfig;
use shared_utils::Clock;

use crate::services::countdown::time_remaining;

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Keeps a countdown string fresh for one target instant.
///
/// A background task recomputes the countdown every `period` (first run
/// immediately) and publishes it on a watch channel. The task stops when the
/// target is cleared, on `cancel`, or when the ticker is dropped. Must be
/// created inside a Tokio runtime.
pub struct CountdownTicker {
    clock: Arc<dyn Clock>,
    period: Duration,
    target: Option<DateTime<Utc>>,
    sender: Arc<watch::Sender<Option<String>>>,
    receiver: watch::Receiver<Option<String>>,
    task: Option<JoinHandle<()>>,
}

impl CountdownTicker {
    pub fn spawn(target: Option<DateTime<Utc>>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);
        let mut ticker = Self {
            clock,
            period: period.max(MIN_PERIOD),
            target: None,
            sender: Arc::new(sender),
            receiver,
            task: None,
        };
        ticker.retarget(target);
        ticker
    }

    pub fn from_config(target: Option<DateTime<Utc>>, clock: Arc<dyn Clock>, config: &DashboardConfig) -> Self {
        Self::spawn(target, clock, Duration::from_secs(config.refresh_interval_seconds))
    }

    /// Point the ticker at a new instant, or stop it with `None`.
    pub fn retarget(&mut self, target: Option<DateTime<Utc>>) {
        self.cancel();
        self.target = target;

        match target {
            Some(target) => {
                info!("Starting countdown to {} every {:?}", target, self.period);
                let task = tokio::spawn(run_countdown(
                    target,
                    Arc::clone(&self.clock),
                    self.period,
                    Arc::clone(&self.sender),
                ));
                self.task = Some(task);
            }
            None => {
                debug!("Countdown target cleared");
                self.sender.send_replace(None);
            }
        }
    }

    /// Stop refreshing. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Countdown refresh cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn target(&self) -> Option<DateTime<Utc>> {
        self.target
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.receiver.clone()
    }

    /// Most recently published countdown.
    pub fn current(&self) -> Option<String> {
        self.receiver.borrow().clone()
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_countdown(
    target: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    period: Duration,
    sender: Arc<watch::Sender<Option<String>>>,
) {
    let mut ticks = interval(period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        let text = time_remaining(Some(target), clock.now());
        trace!("Countdown tick: {:?}", text);
        sender.send_replace(text);
    }
}
