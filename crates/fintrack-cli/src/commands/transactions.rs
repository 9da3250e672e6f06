//! Transaction command implementations

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use fintrack_core::db::Database;
use fintrack_core::models::{flexible_datetime, NewTransaction, Transaction};
use fintrack_core::{AIBackend, CategoryClassifier, ClassificationSource, NotificationParser};

use super::{format_won, truncate};

fn category_label(tx: &Transaction) -> String {
    match tx.category {
        Some(category) => format!("{} ({})", category, category.english_name()),
        None => "(pending)".to_string(),
    }
}

fn print_transaction_row(tx: &Transaction) {
    println!(
        "   [{}] {} │ {:>12} │ {:<30} │ {}",
        tx.id,
        tx.transaction_date.format("%Y-%m-%d %H:%M"),
        format_won(tx.amount),
        truncate(&tx.vendor, 30),
        category_label(tx)
    );
}

/// Accept a bare date (midnight) or any date-time the API accepts
pub fn parse_date_arg(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    flexible_datetime::parse(raw).with_context(|| {
        format!(
            "Invalid date '{}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)",
            raw
        )
    })
}

pub fn cmd_transactions_list(db: &Database, user_id: &str, limit: usize) -> Result<()> {
    let transactions = db.list_transactions_for_user(user_id)?;

    if transactions.is_empty() {
        println!("No transactions found for {}. Record one with:", user_id);
        println!("  fintrack transactions add --user {} --amount 15000 --vendor 스타벅스", user_id);
        return Ok(());
    }

    println!();
    println!("📝 Transactions for {} ({} total)", user_id, transactions.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions.iter().take(limit) {
        print_transaction_row(tx);
    }

    Ok(())
}

/// Without a subcommand, show what is still waiting for a category
pub fn cmd_transactions_uncategorized(db: &Database) -> Result<()> {
    let pending = db.list_uncategorized_transactions(20)?;

    if pending.is_empty() {
        println!("✅ Every transaction has a category.");
        println!("   Use 'fintrack transactions list --user <id>' to browse.");
        return Ok(());
    }

    println!();
    println!("⏳ Uncategorized Transactions");
    println!("   ─────────────────────────────────────────────────────────────");
    for tx in &pending {
        print_transaction_row(tx);
    }
    println!();
    println!("   Run 'fintrack transactions classify' to categorize them.");

    Ok(())
}

/// Store a transaction and categorize it in the foreground
async fn record(
    db: &Database,
    classifier: &CategoryClassifier,
    tx: &NewTransaction,
) -> Result<Transaction> {
    tx.validate()?;

    let stored = db.insert_transaction(tx).context("Failed to store transaction")?;
    let (category, source) = classifier.classify_with_source(&stored.vendor).await;
    db.update_transaction_category(stored.id, category)?;

    let via = match source {
        ClassificationSource::Remote => "AI backend",
        ClassificationSource::Rules => "keyword rules",
    };
    println!(
        "✅ Recorded transaction {}: {} at {} → {} ({}, via {})",
        stored.id,
        format_won(stored.amount),
        stored.vendor,
        category,
        category.english_name(),
        via
    );

    Ok(db.get_transaction(stored.id)?.unwrap_or(stored))
}

pub async fn cmd_transactions_add(
    db: &Database,
    classifier: &CategoryClassifier,
    user_id: &str,
    amount: i64,
    vendor: &str,
    date: Option<&str>,
) -> Result<Transaction> {
    let transaction_date = match date {
        Some(raw) => parse_date_arg(raw)?,
        None => Utc::now().naive_utc(),
    };

    let tx = NewTransaction {
        user_id: user_id.to_string(),
        amount,
        vendor: vendor.to_string(),
        raw_text: String::new(),
        transaction_date,
    };
    record(db, classifier, &tx).await
}

/// Parse notification text; with `save_for` set, record it for that user
pub async fn cmd_transactions_parse(
    db: &Database,
    classifier: &CategoryClassifier,
    text: &str,
    save_for: Option<&str>,
) -> Result<Option<Transaction>> {
    let parser = NotificationParser::new()?;
    let Some(parsed) = parser.parse(text, Utc::now().naive_utc()) else {
        println!("❌ No amount and vendor found in:");
        println!("   {}", text);
        anyhow::bail!("Could not parse notification text");
    };

    println!();
    println!("🔎 Parsed Notification");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Amount:  {}", format_won(parsed.amount));
    println!("   Vendor:  {}", parsed.vendor);
    println!(
        "   Date:    {}",
        parsed.transaction_date.format("%Y-%m-%d %H:%M")
    );
    println!("   Rules:   {}", fintrack_core::classify_by_rules(&parsed.vendor));

    let Some(user_id) = save_for else {
        println!();
        println!("   Use --save <user_id> to record it.");
        return Ok(None);
    };

    println!();
    let tx = parsed.into_transaction(user_id, text);
    Ok(Some(record(db, classifier, &tx).await?))
}

pub async fn cmd_transactions_classify(
    db: &Database,
    classifier: &CategoryClassifier,
    limit: i64,
) -> Result<()> {
    match classifier.backend() {
        Some(client) => {
            println!(
                "🤖 Classifying with {} (model: {}), keyword rules as fallback",
                client.host(),
                client.model()
            );
        }
        None => {
            println!("🏷️  Classifying with keyword rules");
            println!("   💡 Tip: Set OPENAI_API_KEY or OLLAMA_HOST for AI classification");
        }
    }

    let result = classifier.backfill(db, limit).await?;

    if result.transactions_processed == 0 {
        println!("✅ Nothing to classify.");
        return Ok(());
    }

    println!();
    println!("✅ Classified {} transactions", result.transactions_processed);
    println!("   AI backend:    {}", result.by_remote);
    println!("   Keyword rules: {}", result.by_rules);
    if result.missing > 0 {
        println!("   ⚠️  Deleted meanwhile: {}", result.missing);
    }

    Ok(())
}
