//! Savings goal projection
//!
//! Averages the savings of the three calendar months before `now` and
//! projects that average linearly over the requested horizon. Fixed
//! expenses are not subtracted here, unlike the daily budget.

use chrono::{Datelike, NaiveDateTime};
use tracing::debug;

use crate::budget::month_window;
use crate::db::Database;
use crate::error::Result;
use crate::models::Forecast;

/// Number of trailing months averaged
pub const TRAILING_MONTHS: u32 = 3;

/// `(year, month)` of the `n`th calendar month before the given one
pub fn months_back(year: i32, month: u32, n: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - n as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Clamp a wide intermediate into the reported range
pub(crate) fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// The pure projection arithmetic
///
/// Computed in `i128` so that extreme budgets or horizons cannot overflow;
/// `achievable` is decided on the exact values and the reported amounts
/// saturate at the `i64` bounds.
pub fn compute_forecast(savings: &[i128], target_amount: i64, months: i64) -> Forecast {
    let count = savings.len().max(1) as i128;
    let avg = savings.iter().sum::<i128>().div_euclid(count);
    let projected = avg * i128::from(months);
    let target = i128::from(target_amount);

    Forecast {
        achievable: projected >= target,
        monthly_saving_avg: saturate(avg),
        projected_total: saturate(projected),
        deficit: saturate((target - projected).max(0)),
    }
}

/// Project whether `target_amount` is reachable within `months`
pub fn forecast(
    db: &Database,
    user_id: &str,
    target_amount: i64,
    months: i64,
    now: NaiveDateTime,
) -> Result<Forecast> {
    let user = db.require_user(user_id)?;
    let today = now.date();

    let mut savings = Vec::with_capacity(TRAILING_MONTHS as usize);
    for i in 1..=TRAILING_MONTHS {
        let (year, month) = months_back(today.year(), today.month(), i);
        let (start, end) = month_window(year, month)?;
        let spent = db.sum_spending_between(user_id, start, end)?;
        // A month with no transactions counts as fully saved
        savings.push(i128::from(user.monthly_budget) - i128::from(spent));
    }

    let result = compute_forecast(&savings, target_amount, months);
    debug!(
        user_id = %user_id,
        ?savings,
        projected_total = result.projected_total,
        "Computed savings forecast"
    );
    Ok(result)
}
