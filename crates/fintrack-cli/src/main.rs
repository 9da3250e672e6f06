//! FinTrack CLI - Personal finance tracking backend
//!
//! Usage:
//!   fintrack init                          Initialize database
//!   fintrack users add alice               Create a user
//!   fintrack budget daily alice            Today's spendable amount
//!   fintrack serve --port 8000             Start web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use fintrack_core::CategoryClassifier;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve { port, host } => {
            commands::cmd_serve(&cli.db, &host, port, cli.no_encrypt).await
        }
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
        Commands::Users { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                UsersAction::Add {
                    user_id,
                    name,
                    budget,
                    fixed,
                } => commands::cmd_users_add(&db, &user_id, name, budget, fixed).map(|_| ()),
                UsersAction::Show { user_id } => {
                    commands::cmd_users_show(&db, &user_id).map(|_| ())
                }
                UsersAction::SetBudget {
                    user_id,
                    budget,
                    fixed,
                } => commands::cmd_users_set_budget(&db, &user_id, budget, fixed).map(|_| ()),
            }
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let classifier = CategoryClassifier::from_env();
            match action {
                None => commands::cmd_transactions_uncategorized(&db),
                Some(TransactionsAction::List { user, limit }) => {
                    commands::cmd_transactions_list(&db, &user, limit)
                }
                Some(TransactionsAction::Add {
                    user,
                    amount,
                    vendor,
                    date,
                }) => commands::cmd_transactions_add(
                    &db,
                    &classifier,
                    &user,
                    amount,
                    &vendor,
                    date.as_deref(),
                )
                .await
                .map(|_| ()),
                Some(TransactionsAction::Parse { text, save }) => {
                    commands::cmd_transactions_parse(&db, &classifier, &text, save.as_deref())
                        .await
                        .map(|_| ())
                }
                Some(TransactionsAction::Classify { limit }) => {
                    commands::cmd_transactions_classify(&db, &classifier, limit).await
                }
            }
        }
        Commands::Budget { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                BudgetAction::Daily { user_id } => {
                    commands::cmd_budget_daily(&db, &user_id).map(|_| ())
                }
                BudgetAction::Forecast {
                    user_id,
                    target,
                    months,
                } => commands::cmd_budget_forecast(&db, &user_id, target, months).map(|_| ()),
            }
        }
        Commands::Testers { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action.unwrap_or(TestersAction::List) {
                TestersAction::List => commands::cmd_testers_list(&db),
                TestersAction::Emails { json } => {
                    commands::cmd_testers_emails(&db, json).map(|_| ())
                }
                TestersAction::Notify => {
                    commands::cmd_testers_notify(&db, commands::telegram_from_env())
                        .await
                        .map(|_| ())
                }
            }
        }
    }
}
