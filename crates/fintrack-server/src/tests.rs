//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use fintrack_core::models::{Category, NewTransaction, NewUser};
use fintrack_core::test_utils::MockUpstreamServer;
use fintrack_core::{AIClient, MockBackend, OpenAICompatibleBackend};
use http_body_util::BodyExt;
use std::time::Duration;
use tower::ServiceExt;

fn setup_with(db: Database, classifier: CategoryClassifier) -> Router {
    create_router_with_options(db, ServerConfig::default(), classifier).unwrap()
}

fn setup_test_app() -> (Router, Database) {
    let db = Database::in_memory().unwrap();
    (setup_with(db.clone(), CategoryClassifier::rules_only()), db)
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn wait_for_category(db: &Database, id: i64) -> Option<Category> {
    for _ in 0..200 {
        if let Some(category) = db.get_transaction(id).unwrap().and_then(|t| t.category) {
            return Some(category);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

// ========== Transaction API Tests ==========

#[tokio::test]
async fn test_create_transaction_returns_uncategorized_then_classifies() {
    let (app, db) = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/transactions",
            serde_json::json!({
                "user_id": "u1",
                "amount": 6500,
                "vendor": "스타벅스 강남점",
                "raw_text": "신한카드 6,500원 승인 스타벅스 강남점",
                "transaction_date": "2024-02-15T13:00:00"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert!(json["category"].is_null());
    assert_eq!(json["vendor"], "스타벅스 강남점");
    assert_eq!(json["transaction_date"], "2024-02-15T13:00:00");

    let id = json["id"].as_i64().unwrap();
    assert_eq!(wait_for_category(&db, id).await, Some(Category::Food));
}

#[tokio::test]
async fn test_create_transaction_invalid_shape_is_422() {
    let (app, _db) = setup_test_app();

    for body in [
        serde_json::json!({"user_id": "u1", "vendor": "x", "raw_text": "", "transaction_date": "2024-02-15T13:00:00"}),
        serde_json::json!({"user_id": "u1", "amount": "lots", "vendor": "x", "raw_text": "", "transaction_date": "2024-02-15T13:00:00"}),
        serde_json::json!({"user_id": "u1", "amount": 1, "vendor": "x", "raw_text": "", "transaction_date": "someday"}),
        serde_json::json!({"user_id": "u1", "amount": 1, "vendor": "x", "transaction_date": "2024-02-15T13:00:00"}),
    ] {
        let response = app.clone().oneshot(post_json("/transactions", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = get_body_json(response).await;
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_blank_vendor_is_stored_as_other() {
    let (app, db) = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/transactions",
            serde_json::json!({
                "user_id": "u1",
                "amount": 1000,
                "vendor": "  ",
                "raw_text": "",
                "transaction_date": "2024-02-15T13:00:00"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let id = get_body_json(response).await["id"].as_i64().unwrap();
    assert_eq!(wait_for_category(&db, id).await, Some(Category::Other));
}

#[tokio::test]
async fn test_offset_dates_are_stored_as_utc() {
    let (app, db) = setup_test_app();

    let response = app
        .oneshot(post_json(
            "/transactions",
            serde_json::json!({
                "user_id": "u1",
                "amount": 1000,
                "vendor": "택시",
                "raw_text": "",
                "transaction_date": "2024-03-01T08:30:00+09:00"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stored = db.list_transactions_for_user("u1").unwrap();
    assert_eq!(stored[0].transaction_date.to_string(), "2024-02-29 23:30:00");
}

#[tokio::test]
async fn test_list_transactions_newest_first() {
    let (app, db) = setup_test_app();
    for (day, vendor) in [(1, "첫째"), (20, "셋째"), (10, "둘째")] {
        db.insert_transaction(&NewTransaction {
            user_id: "u1".into(),
            amount: 100,
            vendor: vendor.into(),
            raw_text: String::new(),
            transaction_date: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        })
        .unwrap();
    }

    let response = app.oneshot(get("/transactions?user_id=u1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    let vendors: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["vendor"].as_str().unwrap())
        .collect();
    assert_eq!(vendors, vec!["셋째", "둘째", "첫째"]);
}

#[tokio::test]
async fn test_list_transactions_requires_user_id() {
    let (app, _db) = setup_test_app();
    let response = app.oneshot(get("/transactions")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_notification_endpoint_parses_and_records() {
    let (app, db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/transactions/notification",
            serde_json::json!({
                "user_id": "u1",
                "raw_text": "KB국민카드 승인 홍길동 4,500원 02/15 12:30 CU편의점"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["amount"], 4500);
    assert_eq!(json["vendor"], "CU편의점");
    let id = json["id"].as_i64().unwrap();
    assert_eq!(wait_for_category(&db, id).await, Some(Category::Food));

    let response = app
        .oneshot(post_json(
            "/transactions/notification",
            serde_json::json!({"user_id": "u1", "raw_text": "안녕하세요"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ========== Classification Backend Tests ==========

#[tokio::test]
async fn test_remote_label_is_used_when_valid() {
    let upstream = MockUpstreamServer::start().await;
    upstream.answer_with("쇼핑");

    let db = Database::in_memory().unwrap();
    let backend = OpenAICompatibleBackend::with_api_key(&upstream.url(), "gpt-4o-mini", "sk-test");
    let app = setup_with(
        db.clone(),
        CategoryClassifier::new(Some(AIClient::OpenAICompatible(backend))),
    );

    let response = app
        .oneshot(post_json(
            "/transactions",
            serde_json::json!({
                "user_id": "u1",
                "amount": 6500,
                "vendor": "스타벅스",
                "raw_text": "",
                "transaction_date": "2024-02-15T13:00:00"
            }),
        ))
        .await
        .unwrap();
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    assert_eq!(wait_for_category(&db, id).await, Some(Category::Shopping));
    assert_eq!(upstream.classify_calls(), 1);
}

#[tokio::test]
async fn test_remote_outage_falls_back_to_rules() {
    let upstream = MockUpstreamServer::start().await;
    upstream.set_failing(true);

    let db = Database::in_memory().unwrap();
    let backend = OpenAICompatibleBackend::new(&upstream.url(), "gpt-4o-mini");
    let app = setup_with(
        db.clone(),
        CategoryClassifier::new(Some(AIClient::OpenAICompatible(backend))),
    );

    let response = app
        .oneshot(post_json(
            "/transactions",
            serde_json::json!({
                "user_id": "u1",
                "amount": 6500,
                "vendor": "스타벅스 강남점",
                "raw_text": "",
                "transaction_date": "2024-02-15T13:00:00"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let id = get_body_json(response).await["id"].as_i64().unwrap();

    assert_eq!(wait_for_category(&db, id).await, Some(Category::Food));
}

#[tokio::test]
async fn test_mock_backend_classifies() {
    let db = Database::in_memory().unwrap();
    let app = setup_with(
        db.clone(),
        CategoryClassifier::new(Some(AIClient::Mock(MockBackend::answering("의료")))),
    );

    let response = app
        .oneshot(post_json(
            "/transactions",
            serde_json::json!({
                "user_id": "u1",
                "amount": 30000,
                "vendor": "동네 가게",
                "raw_text": "",
                "transaction_date": "2024-02-15T13:00:00"
            }),
        ))
        .await
        .unwrap();
    let id = get_body_json(response).await["id"].as_i64().unwrap();
    assert_eq!(wait_for_category(&db, id).await, Some(Category::Medical));
}

// ========== Budget and Forecast API Tests ==========

#[tokio::test]
async fn test_daily_budget_for_current_month() {
    let (app, db) = setup_test_app();
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    let today = Utc::now().naive_utc().date();
    db.insert_transaction(&NewTransaction {
        user_id: "u1".into(),
        amount: 200_000,
        vendor: "마트".into(),
        raw_text: String::new(),
        transaction_date: today.with_day(1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
    })
    .unwrap();

    let response = app.oneshot(get("/budget/daily?user_id=u1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["spent_this_month"], 200_000);
    assert_eq!(json["remaining_this_month"], 500_000);
    let days_left = json["days_left"].as_i64().unwrap();
    assert!((1..=31).contains(&days_left));
    assert_eq!(
        json["daily_budget"].as_i64().unwrap(),
        500_000_i64.div_euclid(days_left)
    );
}

#[tokio::test]
async fn test_daily_budget_unknown_user_is_404() {
    let (app, _db) = setup_test_app();
    let response = app.oneshot(get("/budget/daily?user_id=ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = get_body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_forecast_without_history() {
    let (app, db) = setup_test_app();
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    let response = app
        .oneshot(post_json(
            "/plan/forecast",
            serde_json::json!({"user_id": "u1", "target_amount": 3_000_000, "months": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["monthly_saving_avg"], 1_000_000);
    assert_eq!(json["projected_total"], 3_000_000);
    assert_eq!(json["achievable"], true);
    assert_eq!(json["deficit"], 0);
}

#[tokio::test]
async fn test_forecast_counts_last_month_spending() {
    let (app, db) = setup_test_app();
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    // Anything in the previous calendar month
    let first_of_month = Utc::now().naive_utc().date().with_day(1).unwrap();
    let last_month = first_of_month - ChronoDuration::days(1);
    db.insert_transaction(&NewTransaction {
        user_id: "u1".into(),
        amount: 900_000,
        vendor: "월세".into(),
        raw_text: String::new(),
        transaction_date: last_month.and_hms_opt(12, 0, 0).unwrap(),
    })
    .unwrap();

    let response = app
        .oneshot(post_json(
            "/plan/forecast",
            serde_json::json!({"user_id": "u1", "target_amount": 5_000_000, "months": 6}),
        ))
        .await
        .unwrap();
    let json = get_body_json(response).await;

    // savings: 100k, 1M, 1M → avg 700k
    assert_eq!(json["monthly_saving_avg"], 700_000);
    assert_eq!(json["projected_total"], 4_200_000);
    assert_eq!(json["achievable"], false);
    assert_eq!(json["deficit"], 800_000);
}

#[tokio::test]
async fn test_forecast_errors() {
    let (app, db) = setup_test_app();
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/plan/forecast",
            serde_json::json!({"user_id": "ghost", "target_amount": 1, "months": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unknown user wins over an empty horizon
    let response = app
        .clone()
        .oneshot(post_json(
            "/plan/forecast",
            serde_json::json!({"user_id": "ghost", "target_amount": 1, "months": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post_json(
            "/plan/forecast",
            serde_json::json!({"user_id": "u1", "target_amount": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_forecast_zero_and_huge_horizons() {
    let (app, db) = setup_test_app();
    db.create_user(&NewUser::with_defaults("u1")).unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/plan/forecast",
            serde_json::json!({"user_id": "u1", "target_amount": 1, "months": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["projected_total"], 0);
    assert_eq!(json["achievable"], false);
    assert_eq!(json["deficit"], 1);

    let response = app
        .oneshot(post_json(
            "/plan/forecast",
            serde_json::json!({"user_id": "u1", "target_amount": 1, "months": 10_000_000_000_000i64}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["projected_total"], i64::MAX);
    assert_eq!(json["achievable"], true);
}

// ========== User API Tests ==========

#[tokio::test]
async fn test_create_user_with_defaults_and_duplicate() {
    let (app, db) = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_json("/users", serde_json::json!({"user_id": "u1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["user_id"], "u1");
    assert!(json["id"].as_i64().unwrap() > 0);

    let user = db.get_user("u1").unwrap().unwrap();
    assert_eq!(user.name, "사용자");
    assert_eq!(user.monthly_budget, 1_000_000);
    assert_eq!(user.fixed_expenses, 300_000);

    let response = app
        .oneshot(post_json("/users", serde_json::json!({"user_id": "u1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ========== Tester API Tests ==========

#[tokio::test]
async fn test_tester_registration_flow() {
    let (app, _db) = setup_test_app();

    for (email, name) in [("a@x.com", "민수"), ("b@x.com", "민수")] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/testers",
                serde_json::json!({"email": email, "name": name}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_body_json(response).await;
        assert_eq!(json["notified"], false);
    }

    let response = app
        .clone()
        .oneshot(post_json(
            "/testers",
            serde_json::json!({"email": "a@x.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(post_json(
            "/testers",
            serde_json::json!({"email": "not an email"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.clone().oneshot(get("/testers")).await.unwrap();
    let json = get_body_json(response).await;
    let emails: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["b@x.com", "a@x.com"]);

    let response = app.oneshot(get("/testers/emails")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["csv"], "a@x.com,b@x.com");
    assert_eq!(json["emails"][0], "a@x.com");
}

#[tokio::test]
async fn test_empty_tester_export() {
    let (app, _db) = setup_test_app();
    let response = app.oneshot(get("/testers/emails")).await.unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["csv"], "");
}

// ========== Misc ==========

#[tokio::test]
async fn test_health() {
    let (app, _db) = setup_test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = get_body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["classify_workers"], DEFAULT_CLASSIFY_WORKERS);
}

#[tokio::test]
async fn test_telegram_alert_through_mock_upstream() {
    let upstream = MockUpstreamServer::start().await;
    let db = Database::in_memory().unwrap();
    db.register_tester(&fintrack_core::NewTester {
        email: "a@x.com".into(),
        name: String::new(),
    })
    .unwrap();

    let telegram = TelegramNotifier::new(&upstream.url(), "123:abc", "42");
    let notifier = TesterNotifier::new(db.clone(), Arc::new(telegram));
    assert_eq!(
        notifier.tick().await.unwrap(),
        fintrack_core::TickOutcome::Notified(1)
    );

    let messages = upstream.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("📧 a@x.com (미입력)"));
    assert_eq!(db.count_testers().unwrap(), (1, 0));
}

#[tokio::test]
async fn test_telegram_outage_leaves_testers_pending() {
    let upstream = MockUpstreamServer::start().await;
    upstream.set_failing(true);
    let db = Database::in_memory().unwrap();
    db.register_tester(&fintrack_core::NewTester {
        email: "a@x.com".into(),
        name: String::new(),
    })
    .unwrap();

    let telegram = TelegramNotifier::new(&upstream.url(), "123:abc", "42");
    let notifier = TesterNotifier::new(db.clone(), Arc::new(telegram));
    assert!(notifier.tick().await.is_err());
    assert_eq!(db.count_testers().unwrap(), (1, 1));
}
