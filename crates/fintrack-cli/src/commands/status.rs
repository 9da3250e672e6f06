//! Status command implementation

use std::path::Path;

use anyhow::Result;
use fintrack_core::db::DB_KEY_ENV;
use fintrack_core::{AIBackend, AIClient};

use super::open_db;

fn env_set(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| !v.trim().is_empty())
}

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    use std::fs;

    println!();
    println!("📊 FinTrack Status");
    println!("   ─────────────────────────────────────────────────────────────");

    // Database path
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    let has_key = env_set(DB_KEY_ENV);
    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else if has_key {
        println!("   🔒 Encryption: ENABLED ({}=***)", DB_KEY_ENV);
    } else {
        println!("   ❌ Encryption: REQUIRED but {} not set", DB_KEY_ENV);
    }

    if db_path.exists() {
        match open_db(db_path, no_encrypt) {
            Ok(db) => {
                if let Ok(true) = db.is_encrypted() {
                    println!("   🔐 SQLCipher: active");
                }
                println!();
                if let Ok(count) = db.count_transactions() {
                    println!("   Transactions: {}", count);
                }
                if let Ok((total, pending)) = db.count_testers() {
                    println!("   Testers: {} ({} not yet announced)", total, pending);
                }
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
                if !no_encrypt && !has_key {
                    println!("      Set {} or use --no-encrypt", DB_KEY_ENV);
                } else if has_key {
                    println!("      (Check if {} is correct)", DB_KEY_ENV);
                }
            }
        }
    }

    println!();
    println!("   Integrations");
    match AIClient::from_env() {
        Some(client) => println!(
            "   🤖 Classifier: {} (model: {})",
            client.host(),
            client.model()
        ),
        None => println!("   🏷️  Classifier: keyword rules (set OPENAI_API_KEY or OLLAMA_HOST)"),
    }

    if env_set("TELEGRAM_BOT_TOKEN") && env_set("TELEGRAM_CHAT_ID") {
        println!("   📨 Tester alerts: Telegram");
    } else {
        println!("   📨 Tester alerts: off (set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID)");
    }

    if env_set("GOOGLE_SERVICE_ACCOUNT_JSON") {
        println!("   🧪 Store credentials: present (testers are still added by hand)");
    } else {
        println!("   🧪 Store credentials: not set");
    }

    println!();
    Ok(())
}
