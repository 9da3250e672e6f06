//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FinTrack - Personal finance tracking backend
#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "Transaction tracking, daily budgets and savings forecasts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "fintrack.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set FINTRACK_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Show database and integration status
    Status,

    /// Manage users and their budgets
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Record, list and categorize transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Daily budget and savings forecast
    Budget {
        #[command(subcommand)]
        action: BudgetAction,
    },

    /// Manage beta testers
    Testers {
        #[command(subcommand)]
        action: Option<TestersAction>,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// Create a user (defaults: 1,000,000 budget, 300,000 fixed expenses)
    Add {
        /// External user identifier
        user_id: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,

        /// Monthly budget in won
        #[arg(long)]
        budget: Option<i64>,

        /// Fixed monthly expenses in won
        #[arg(long)]
        fixed: Option<i64>,
    },

    /// Show a user
    Show {
        user_id: String,
    },

    /// Change a user's monthly budget and/or fixed expenses
    SetBudget {
        user_id: String,

        /// Monthly budget in won
        #[arg(long)]
        budget: Option<i64>,

        /// Fixed monthly expenses in won
        #[arg(long)]
        fixed: Option<i64>,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List a user's transactions, newest first
    List {
        /// User to list for
        #[arg(short, long)]
        user: String,

        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Record a transaction and categorize it
    Add {
        /// Owning user
        #[arg(short, long)]
        user: String,

        /// Amount in won
        #[arg(short, long)]
        amount: i64,

        /// Merchant name
        #[arg(long)]
        vendor: String,

        /// Transaction time (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Parse card/bank notification text (use --save to record it)
    Parse {
        /// Raw notification text
        text: String,

        /// Record the parsed transaction for this user
        #[arg(long)]
        save: Option<String>,
    },

    /// Categorize transactions that have no category yet
    Classify {
        /// Maximum number of transactions to process
        #[arg(short, long, default_value = "100")]
        limit: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Today's spendable amount for a user
    Daily {
        user_id: String,
    },

    /// Will the user reach a savings target in time?
    Forecast {
        user_id: String,

        /// Savings target in won
        #[arg(short, long)]
        target: i64,

        /// Months until the target date
        #[arg(short, long)]
        months: i64,
    },
}

#[derive(Subcommand)]
pub enum TestersAction {
    /// List testers, newest first
    List,

    /// Export tester emails as a comma-joined list
    Emails {
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Send the pending-tester alert now
    Notify,
}
