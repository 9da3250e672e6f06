//! FinTrack Core Library
//!
//! Shared functionality for the FinTrack personal finance backend:
//! - Database access and migrations
//! - Vendor categorization (AI backend with keyword-rule fallback)
//! - Daily budget and savings forecast engines
//! - Card/bank notification parsing
//! - Beta tester operator alerts

pub mod ai;
pub mod budget;
pub mod classify;
pub mod db;
pub mod error;
pub mod forecast;
pub mod models;
pub mod notify;
pub mod parser;

/// Test utilities including a mock upstream server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIBackend, AIClient, MockBackend, OllamaBackend, OpenAICompatibleBackend};
pub use classify::{classify_by_rules, BackfillResult, CategoryClassifier, ClassificationSource};
pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    Category, DailyBudget, Forecast, NewTester, NewTransaction, NewUser, Tester,
    TesterEmailExport, Transaction, User,
};
pub use notify::{compose_message, Notifier, TelegramNotifier, TesterNotifier, TickOutcome};
pub use parser::{NotificationParser, ParsedNotification};
