//! Integration tests for fintrack-core
//!
//! These tests exercise the record → classify → budget / forecast workflow
//! and the tester alert cycle through the public API only.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use fintrack_core::{
    budget, forecast, AIClient, Category, CategoryClassifier, Database, Error, MockBackend,
    NewTester, NewTransaction, NewUser, Notifier, NotificationParser, TesterEmailExport,
    TesterNotifier, TickOutcome,
};

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn record(db: &Database, user_id: &str, amount: i64, vendor: &str, date: NaiveDateTime) -> i64 {
    db.insert_transaction(&NewTransaction {
        user_id: user_id.into(),
        amount,
        vendor: vendor.into(),
        raw_text: String::new(),
        transaction_date: date,
    })
    .expect("Failed to insert transaction")
    .id
}

// =============================================================================
// Classification
// =============================================================================

#[tokio::test]
async fn test_record_then_classify_with_unavailable_backend() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let id = record(&db, "u1", 6_500, "스타벅스 강남점", at(2024, 2, 15, 13));

    let classifier = CategoryClassifier::new(Some(AIClient::Mock(MockBackend::failing())));
    let written = classifier
        .classify_and_update(&db, id, "스타벅스 강남점")
        .await
        .unwrap();

    assert_eq!(written, Some(Category::Food));
    let stored = db.get_transaction(id).unwrap().unwrap();
    assert_eq!(stored.category, Some(Category::Food));
}

#[tokio::test]
async fn test_classifier_always_yields_a_category() {
    let classifiers = [
        CategoryClassifier::rules_only(),
        CategoryClassifier::new(Some(AIClient::Mock(MockBackend::failing()))),
        CategoryClassifier::new(Some(AIClient::Mock(MockBackend::answering("모름")))),
        CategoryClassifier::new(Some(AIClient::mock())),
    ];

    for classifier in &classifiers {
        for vendor in ["", "   ", "스타벅스", "???", "ATM 출금", "택시"] {
            let category = classifier.classify(vendor).await;
            assert!(Category::ALL.contains(&category));
        }
    }
}

// =============================================================================
// Budget and forecast
// =============================================================================

#[test]
fn test_daily_budget_scenario() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    record(&db, "u1", 120_000, "이마트", at(2024, 4, 3, 10));
    record(&db, "u1", 80_000, "주유소", at(2024, 4, 18, 19));

    // April has 30 days; on the 21st, 10 remain
    let result = budget::daily_budget(&db, "u1", at(2024, 4, 21, 8)).unwrap();
    assert_eq!(result.spent_this_month, 200_000);
    assert_eq!(result.days_left, 10);
    assert_eq!(result.daily_budget, 50_000);
}

#[test]
fn test_overspent_month_clamps_to_zero() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    db.create_user(&NewUser::with_defaults("u1")).unwrap();
    record(&db, "u1", 2_000_000, "백화점", at(2024, 4, 2, 10));

    let result = budget::daily_budget(&db, "u1", at(2024, 4, 10, 8)).unwrap();
    assert_eq!(result.daily_budget, 0);
    assert_eq!(result.remaining_this_month, 0);
    assert_eq!(result.spent_this_month, 2_000_000);
}

#[test]
fn test_forecast_scenario_and_properties() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    // savings: May 100k, Apr 200k, Mar 300k
    record(&db, "u1", 900_000, "월세", at(2024, 5, 1, 9));
    record(&db, "u1", 800_000, "월세", at(2024, 4, 1, 9));
    record(&db, "u1", 700_000, "월세", at(2024, 3, 1, 9));

    let now = at(2024, 6, 5, 12);
    let result = forecast::forecast(&db, "u1", 3_000_000, 6, now).unwrap();
    assert_eq!(result.monthly_saving_avg, 200_000);
    assert_eq!(result.projected_total, 1_200_000);
    assert!(!result.achievable);
    assert_eq!(result.deficit, 1_800_000);

    for (target, months) in [(0, 1), (600_000, 3), (600_001, 3), (-5, 12)] {
        let f = forecast::forecast(&db, "u1", target, months, now).unwrap();
        assert_eq!(f.achievable, f.projected_total >= target);
        assert_eq!(f.deficit, (target - f.projected_total).max(0));
    }
}

#[test]
fn test_unknown_user_paths() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let now = at(2024, 6, 5, 12);
    assert!(matches!(
        budget::daily_budget(&db, "ghost", now),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        forecast::forecast(&db, "ghost", 1, 1, now),
        Err(Error::NotFound(_))
    ));
}

// =============================================================================
// Notification parsing
// =============================================================================

#[test]
fn test_parsed_notification_feeds_budget() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    let parser = NotificationParser::new().unwrap();
    let raw = "신한카드(1234) 김*수님 15,000원 승인 04/15 13:00 스타벅스강남점";
    let parsed = parser.parse(raw, at(2024, 4, 20, 9)).unwrap();
    let tx = db
        .insert_transaction(&parsed.into_transaction("u1", raw))
        .unwrap();
    assert_eq!(tx.raw_text, raw);

    let result = budget::daily_budget(&db, "u1", at(2024, 4, 20, 9)).unwrap();
    assert_eq!(result.spent_this_month, 15_000);
}

// =============================================================================
// Tester alerts
// =============================================================================

#[derive(Default)]
struct Outbox(Mutex<Vec<String>>);

#[async_trait]
impl Notifier for Outbox {
    async fn send(&self, text: &str) -> fintrack_core::Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "outbox"
    }
}

#[tokio::test]
async fn test_tester_signup_to_alert_cycle() {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let outbox = Arc::new(Outbox::default());
    let notifier = TesterNotifier::new(db.clone(), outbox.clone());

    assert_eq!(notifier.tick().await.unwrap(), TickOutcome::Idle);

    db.register_tester(&NewTester {
        email: "a@x.com".into(),
        name: "민수".into(),
    })
    .unwrap();
    db.register_tester(&NewTester {
        email: "b@x.com".into(),
        name: String::new(),
    })
    .unwrap();

    assert_eq!(notifier.tick().await.unwrap(), TickOutcome::Notified(2));
    assert_eq!(notifier.tick().await.unwrap(), TickOutcome::Idle);

    // A later signup is alerted on its own
    db.register_tester(&NewTester {
        email: "c@x.com".into(),
        name: String::new(),
    })
    .unwrap();
    assert_eq!(notifier.tick().await.unwrap(), TickOutcome::Notified(1));

    let sent = outbox.0.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("📧 a@x.com (민수)"));
    assert!(sent[0].contains("📧 b@x.com (미입력)"));
    assert!(sent[1].starts_with("🆕 새 테스터 1명 신청!"));

    let export = TesterEmailExport::new(db.list_tester_emails().unwrap());
    assert_eq!(export.count, 3);
    assert_eq!(export.csv, "a@x.com,b@x.com,c@x.com");
}
