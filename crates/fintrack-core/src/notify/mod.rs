//! Operator alerts for new beta testers
//!
//! `TesterNotifier::tick` is one pass of the periodic check: find testers
//! nobody has been told about, send a single batched message, then mark
//! them. The timer that drives it lives with the server.

mod telegram;

pub use telegram::TelegramNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::Result;
use crate::models::Tester;

/// Placeholder shown for testers who left the name blank
pub const UNNAMED_TESTER: &str = "미입력";

/// An outbound text channel to the operator
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message; any network or service fault is an error
    async fn send(&self, text: &str) -> Result<()>;

    /// Human-readable channel name (for logging)
    fn name(&self) -> &str;
}

/// Render the alert for a batch of pending testers
pub fn compose_message(testers: &[Tester]) -> String {
    let lines: Vec<String> = testers
        .iter()
        .map(|t| {
            let name = if t.name.trim().is_empty() {
                UNNAMED_TESTER
            } else {
                t.name.as_str()
            };
            format!("  📧 {} ({})", t.email, name)
        })
        .collect();

    format!(
        "🆕 새 테스터 {}명 신청!\n\n{}\n\n👉 Play Console에 추가해주세요",
        testers.len(),
        lines.join("\n")
    )
}

/// What a single check did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nobody was pending; nothing was sent
    Idle,
    /// One message went out and this many testers were marked
    Notified(usize),
}

/// Relays new tester registrations to the operator
#[derive(Clone)]
pub struct TesterNotifier {
    db: Database,
    channel: Arc<dyn Notifier>,
}

impl TesterNotifier {
    pub fn new(db: Database, channel: Arc<dyn Notifier>) -> Self {
        Self { db, channel }
    }

    /// Name of the underlying channel
    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Run one check
    ///
    /// Pending testers are re-read on every call. When the send fails
    /// nobody is marked, so the next tick retries the whole batch. When
    /// marking fails after a successful send, the next tick repeats the
    /// message.
    pub async fn tick(&self) -> Result<TickOutcome> {
        let pending = self.db.list_unnotified_testers()?;
        if pending.is_empty() {
            return Ok(TickOutcome::Idle);
        }

        let message = compose_message(&pending);
        if let Err(e) = self.channel.send(&message).await {
            warn!(
                channel = self.channel.name(),
                pending = pending.len(),
                "Tester alert not delivered, will retry: {}",
                e
            );
            return Err(e);
        }

        let ids: Vec<i64> = pending.iter().map(|t| t.id).collect();
        let marked = self.db.mark_testers_notified(&ids)?;
        info!(count = marked, "Sent new tester alert");
        Ok(TickOutcome::Notified(marked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::NewTester;
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for Capture {
        async fn send(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::External("channel down".into()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn tester(email: &str, name: &str) -> Tester {
        Tester {
            id: 1,
            email: email.into(),
            name: name.into(),
            notified: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_compose_message_format() {
        let text = compose_message(&[tester("a@x.com", "민수"), tester("b@x.com", "")]);
        assert_eq!(
            text,
            "🆕 새 테스터 2명 신청!\n\n  📧 a@x.com (민수)\n  📧 b@x.com (미입력)\n\n👉 Play Console에 추가해주세요"
        );
    }

    #[tokio::test]
    async fn test_tick_batches_then_goes_idle() {
        let db = Database::in_memory().unwrap();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            db.register_tester(&NewTester {
                email: email.into(),
                name: String::new(),
            })
            .unwrap();
        }

        let capture = Arc::new(Capture::default());
        let notifier = TesterNotifier::new(db.clone(), capture.clone());

        assert_eq!(notifier.tick().await.unwrap(), TickOutcome::Notified(3));
        assert_eq!(notifier.tick().await.unwrap(), TickOutcome::Idle);

        let sent = capture.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("🆕 새 테스터 3명 신청!"));
        assert_eq!(db.count_testers().unwrap(), (3, 0));
    }

    #[tokio::test]
    async fn test_failed_send_marks_nobody() {
        let db = Database::in_memory().unwrap();
        db.register_tester(&NewTester {
            email: "a@x.com".into(),
            name: "A".into(),
        })
        .unwrap();

        let down = Arc::new(Capture {
            fail: true,
            ..Default::default()
        });
        let notifier = TesterNotifier::new(db.clone(), down);
        assert!(notifier.tick().await.is_err());
        assert_eq!(db.list_unnotified_testers().unwrap().len(), 1);

        // Channel recovers: the same tester goes out on the next tick
        let up = Arc::new(Capture::default());
        let notifier = TesterNotifier::new(db.clone(), up.clone());
        assert_eq!(notifier.tick().await.unwrap(), TickOutcome::Notified(1));
        assert!(up.sent.lock().unwrap()[0].contains("a@x.com (A)"));
    }
}
