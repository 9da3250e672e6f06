//! Budget command implementations (daily budget, savings forecast)

use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use fintrack_core::db::Database;
use fintrack_core::models::{DailyBudget, Forecast};
use fintrack_core::{budget, forecast};

use super::format_won;

pub fn cmd_budget_daily(db: &Database, user_id: &str) -> Result<DailyBudget> {
    daily_as_of(db, user_id, Utc::now().naive_utc())
}

pub fn daily_as_of(db: &Database, user_id: &str, now: NaiveDateTime) -> Result<DailyBudget> {
    let user = db.require_user(user_id)?;
    let result = budget::daily_budget(db, user_id, now)?;

    println!();
    println!("💰 Daily Budget for {} ({})", user.name, user.user_id);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Monthly budget:     {:>14}", format_won(user.monthly_budget));
    println!("   Fixed expenses:     {:>14}", format_won(user.fixed_expenses));
    println!("   Spent this month:   {:>14}", format_won(result.spent_this_month));
    println!("   Remaining:          {:>14}", format_won(result.remaining_this_month));
    println!("   Days left:          {:>14}", result.days_left);
    println!();
    println!("   Safe to spend today: {}", format_won(result.daily_budget));
    if result.daily_budget == 0 {
        println!("   ⚠️  This month's budget is used up");
    }

    Ok(result)
}

pub fn cmd_budget_forecast(
    db: &Database,
    user_id: &str,
    target_amount: i64,
    months: i64,
) -> Result<Forecast> {
    forecast_as_of(db, user_id, target_amount, months, Utc::now().naive_utc())
}

pub fn forecast_as_of(
    db: &Database,
    user_id: &str,
    target_amount: i64,
    months: i64,
    now: NaiveDateTime,
) -> Result<Forecast> {
    let result = forecast::forecast(db, user_id, target_amount, months, now)?;

    println!();
    println!(
        "📈 Savings Forecast: {} in {} month(s)",
        format_won(target_amount),
        months
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Average monthly saving (last {} months): {}",
        forecast::TRAILING_MONTHS,
        format_won(result.monthly_saving_avg)
    );
    println!("   Projected total: {}", format_won(result.projected_total));
    println!();
    if result.achievable {
        println!("   ✅ On track");
    } else {
        println!("   ❌ Short by {}", format_won(result.deficit));
    }

    Ok(result)
}
