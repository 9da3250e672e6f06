//! Daily spendable budget
//!
//! What the user can spend per remaining day of the current calendar month,
//! after fixed expenses and month-to-date spending.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::forecast::saturate;
use crate::models::{DailyBudget, User};

/// First and last day of a calendar month
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Validation(format!("Invalid month: {}-{}", year, month)))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| Error::Validation(format!("Invalid month: {}-{}", year, month)))?;
    Ok((first, next_first - Duration::days(1)))
}

/// Inclusive date-time window covering a whole month
///
/// `[1st 00:00:00, last day 23:59:59]`
pub fn month_window(year: i32, month: u32) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (first, last) = month_bounds(year, month)?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Ok((first.and_time(NaiveTime::MIN), last.and_time(end_of_day)))
}

/// The pure budget arithmetic
///
/// `days_left` counts today. Rounding is floor division, so a negative
/// remainder still yields a zero budget rather than a rounded-up one.
/// The remainder is computed in `i128` and reported amounts saturate at
/// `i64::MAX`.
pub fn compute_daily_budget(
    monthly_budget: i64,
    fixed_expenses: i64,
    spent: i64,
    days_left: i64,
) -> DailyBudget {
    let remaining =
        i128::from(monthly_budget) - i128::from(fixed_expenses) - i128::from(spent);
    let daily_budget = if days_left > 0 {
        remaining.div_euclid(i128::from(days_left)).max(0)
    } else {
        0
    };

    DailyBudget {
        daily_budget: saturate(daily_budget),
        remaining_this_month: saturate(remaining.max(0)),
        days_left,
        spent_this_month: spent,
    }
}

/// Daily budget for a user as of `now`
pub fn daily_budget(db: &Database, user_id: &str, now: NaiveDateTime) -> Result<DailyBudget> {
    let user = db.require_user(user_id)?;
    daily_budget_for(db, &user, now)
}

fn daily_budget_for(db: &Database, user: &User, now: NaiveDateTime) -> Result<DailyBudget> {
    let today = now.date();
    let (start, end) = month_window(today.year(), today.month())?;
    let spent = db.sum_spending_between(&user.user_id, start, end)?;
    let days_left = i64::from(end.date().day()) - i64::from(today.day()) + 1;

    let budget = compute_daily_budget(user.monthly_budget, user.fixed_expenses, spent, days_left);
    debug!(
        user_id = %user.user_id,
        spent,
        days_left,
        daily_budget = budget.daily_budget,
        "Computed daily budget"
    );
    Ok(budget)
}
