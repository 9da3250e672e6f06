//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budget` - Daily budget and savings forecast
//! - `core` - Init and shared utilities (open_db, format_won)
//! - `serve` - Web server command
//! - `status` - Database and integration status
//! - `testers` - Beta tester listing, export and alerts
//! - `transactions` - Transaction commands (list, add, parse, classify)
//! - `users` - User and budget settings

pub mod budget;
pub mod core;
pub mod serve;
pub mod status;
pub mod testers;
pub mod transactions;
pub mod users;

// Re-export command functions for main.rs
pub use budget::*;
pub use core::*;
pub use serve::*;
pub use status::*;
pub use testers::*;
pub use transactions::*;
pub use users::*;

/// Truncate a string to `max` characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
