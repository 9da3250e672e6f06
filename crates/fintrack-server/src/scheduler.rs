//! Periodic tester notification task
//!
//! Enabled when Telegram is configured. Timing comes from:
//!
//! - `FINTRACK_TESTER_CHECK_INTERVAL`: Seconds between checks (default 300, 0 disables)
//!
//! The first check runs one full interval after startup. Errors are logged
//! and retried on the next tick; the loop only ends on shutdown.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use fintrack_core::{TesterNotifier, TickOutcome};

/// Default seconds between tester checks
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Configuration for the tester notifier loop
#[derive(Debug, Clone)]
pub struct TesterNotifierConfig {
    pub interval: Duration,
}

impl Default for TesterNotifierConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
        }
    }
}

impl TesterNotifierConfig {
    /// Parse configuration from environment variables
    ///
    /// Returns None if checks are disabled (`FINTRACK_TESTER_CHECK_INTERVAL=0`).
    pub fn from_env() -> Option<Self> {
        let secs = match std::env::var("FINTRACK_TESTER_CHECK_INTERVAL") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => secs,
                Err(_) => {
                    warn!(
                        value = %raw,
                        "Invalid FINTRACK_TESTER_CHECK_INTERVAL, using {}s",
                        DEFAULT_CHECK_INTERVAL_SECS
                    );
                    DEFAULT_CHECK_INTERVAL_SECS
                }
            },
            Err(_) => DEFAULT_CHECK_INTERVAL_SECS,
        };

        if secs == 0 {
            return None;
        }

        Some(Self {
            interval: Duration::from_secs(secs),
        })
    }
}

/// Handle to a running notifier loop
pub struct NotifierHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl NotifierHandle {
    /// Stop the loop and wait for it to finish
    ///
    /// A tick already in progress completes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!("Tester notifier task failed: {}", e);
        }
    }
}

/// Start the tester notifier as a background task
pub fn start_tester_notifier(
    notifier: TesterNotifier,
    config: TesterNotifierConfig,
) -> NotifierHandle {
    info!(
        "Starting tester notifier: every {}s via {}",
        config.interval.as_secs(),
        notifier.channel_name()
    );

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first immediate tick - the first check waits one interval
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => break,
            }

            match notifier.tick().await {
                Ok(TickOutcome::Idle) => debug!("No new testers"),
                Ok(TickOutcome::Notified(count)) => {
                    info!("Notified operator about {} new tester(s)", count)
                }
                Err(e) => error!("Tester check failed: {}", e),
            }
        }

        info!("Tester notifier stopped");
    });

    NotifierHandle { shutdown_tx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fintrack_core::test_utils::RecordingNotifier;
    use fintrack_core::{Database, NewTester};
    use std::sync::Arc;

    fn register(db: &Database, email: &str) {
        db.register_tester(&NewTester {
            email: email.into(),
            name: String::new(),
        })
        .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_check_waits_one_interval() {
        let db = Database::in_memory().unwrap();
        register(&db, "a@x.com");

        let outbox = Arc::new(RecordingNotifier::new());
        let handle = start_tester_notifier(
            TesterNotifier::new(db.clone(), outbox.clone()),
            TesterNotifierConfig {
                interval: Duration::from_secs(300),
            },
        );

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(outbox.messages().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(outbox.messages().len(), 1);

        // Nothing new: later ticks send nothing
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(outbox.messages().len(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_is_retried_next_tick() {
        let db = Database::in_memory().unwrap();
        register(&db, "a@x.com");

        let outbox = Arc::new(RecordingNotifier::new());
        outbox.set_failing(true);
        let handle = start_tester_notifier(
            TesterNotifier::new(db.clone(), outbox.clone()),
            TesterNotifierConfig {
                interval: Duration::from_secs(60),
            },
        );

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(outbox.messages().is_empty());
        assert_eq!(db.count_testers().unwrap(), (1, 1));

        outbox.set_failing(false);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(outbox.messages().len(), 1);
        assert_eq!(db.count_testers().unwrap(), (1, 0));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop_promptly() {
        let db = Database::in_memory().unwrap();
        let outbox = Arc::new(RecordingNotifier::new());
        let handle = start_tester_notifier(
            TesterNotifier::new(db, outbox),
            TesterNotifierConfig::default(),
        );

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("notifier should stop well before its first tick");
    }
}
