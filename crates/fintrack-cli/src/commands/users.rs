//! User command implementations

use anyhow::{Context, Result};
use fintrack_core::db::Database;
use fintrack_core::models::{NewUser, User};

use super::format_won;

fn print_user(user: &User) {
    println!("   User ID:         {}", user.user_id);
    println!("   Name:            {}", user.name);
    println!("   Monthly budget:  {}", format_won(user.monthly_budget));
    println!("   Fixed expenses:  {}", format_won(user.fixed_expenses));
}

pub fn cmd_users_add(
    db: &Database,
    user_id: &str,
    name: Option<String>,
    monthly_budget: Option<i64>,
    fixed_expenses: Option<i64>,
) -> Result<User> {
    let defaults = NewUser::with_defaults(user_id);
    let new_user = NewUser {
        name: name.unwrap_or(defaults.name),
        monthly_budget: monthly_budget.unwrap_or(defaults.monthly_budget),
        fixed_expenses: fixed_expenses.unwrap_or(defaults.fixed_expenses),
        user_id: defaults.user_id,
    };

    let user = db
        .create_user(&new_user)
        .with_context(|| format!("Failed to create user '{}'", user_id))?;

    println!("✅ Created user (id {})", user.id);
    print_user(&user);

    Ok(user)
}

pub fn cmd_users_show(db: &Database, user_id: &str) -> Result<User> {
    let user = db.require_user(user_id)?;

    println!();
    println!("👤 User");
    println!("   ─────────────────────────────────────────────────────────────");
    print_user(&user);

    let transactions = db.list_transactions_for_user(user_id)?;
    println!("   Transactions:    {}", transactions.len());

    Ok(user)
}

pub fn cmd_users_set_budget(
    db: &Database,
    user_id: &str,
    monthly_budget: Option<i64>,
    fixed_expenses: Option<i64>,
) -> Result<User> {
    if monthly_budget.is_none() && fixed_expenses.is_none() {
        anyhow::bail!("Nothing to change: pass --budget and/or --fixed");
    }
    if monthly_budget.is_some_and(|v| v < 0) || fixed_expenses.is_some_and(|v| v < 0) {
        anyhow::bail!("Budget amounts cannot be negative");
    }

    let user = db.update_user_budget(user_id, monthly_budget, fixed_expenses)?;

    println!("✅ Updated budget for {}", user.user_id);
    print_user(&user);

    Ok(user)
}
