//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use fintrack_server::ServerConfig;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_encrypt: bool) -> Result<()> {
    println!("🚀 Starting FinTrack API server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    let config = ServerConfig::from_env();
    if config.allowed_origins.is_empty() {
        println!("   CORS: same-origin only (set FINTRACK_ALLOWED_ORIGINS to allow others)");
    } else {
        println!("   CORS: {}", config.allowed_origins.join(", "));
    }
    println!("   Classification workers: {}", config.classify_workers);

    if std::env::var("TELEGRAM_BOT_TOKEN").is_err() || std::env::var("TELEGRAM_CHAT_ID").is_err()
    {
        println!();
        println!("   💡 Tip: Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID for new-tester alerts");
    }
    println!();

    let db = open_db(db_path, no_encrypt)?;

    fintrack_server::serve_with_config(db, host, port, config)
        .await
        .context("Server error")
}
