//! Beta tester command implementations

use std::sync::Arc;

use anyhow::Result;
use fintrack_core::db::Database;
use fintrack_core::models::TesterEmailExport;
use fintrack_core::{Notifier, TelegramNotifier, TesterNotifier, TickOutcome};

use super::truncate;

/// The Telegram channel, if configured
pub fn telegram_from_env() -> Option<Arc<dyn Notifier>> {
    TelegramNotifier::from_env().map(|t| Arc::new(t) as Arc<dyn Notifier>)
}

pub fn cmd_testers_list(db: &Database) -> Result<()> {
    let testers = db.list_testers()?;

    if testers.is_empty() {
        println!("No testers registered yet.");
        return Ok(());
    }

    let (total, pending) = db.count_testers()?;

    println!();
    println!("🧪 Beta Testers ({} total, {} not yet announced)", total, pending);
    println!("   ─────────────────────────────────────────────────────────────");

    for tester in testers {
        let marker = if tester.notified { "✓" } else { "•" };
        println!(
            "   {} {} │ {:<32} │ {}",
            marker,
            tester.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&tester.email, 32),
            tester.name
        );
    }

    Ok(())
}

pub fn cmd_testers_emails(db: &Database, json: bool) -> Result<TesterEmailExport> {
    let export = TesterEmailExport::new(db.list_tester_emails()?);

    if json {
        println!("{}", serde_json::to_string_pretty(&export)?);
    } else if export.count == 0 {
        println!("No testers registered yet.");
    } else {
        println!("{}", export.csv);
        eprintln!("({} addresses)", export.count);
    }

    Ok(export)
}

/// Run one notifier tick now instead of waiting for the server's timer
pub async fn cmd_testers_notify(
    db: &Database,
    channel: Option<Arc<dyn Notifier>>,
) -> Result<TickOutcome> {
    let Some(channel) = channel else {
        anyhow::bail!("Telegram is not configured (set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID)");
    };

    println!("📨 Checking for new testers via {}...", channel.name());
    let outcome = TesterNotifier::new(db.clone(), channel).tick().await?;

    match outcome {
        TickOutcome::Idle => println!("✅ No new testers to announce."),
        TickOutcome::Notified(count) => println!("✅ Announced {} new tester(s).", count),
    }

    Ok(outcome)
}
