//! Transaction operations

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};

use super::{format_datetime, parse_datetime, parse_naive_datetime, Database};
use crate::error::Result;
use crate::models::{Category, NewTransaction, Transaction};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, vendor, category, raw_text, transaction_date, created_at";

impl Database {
    /// Insert a transaction with an unset category, returning the stored row
    pub fn insert_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, amount, vendor, raw_text, transaction_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                tx.user_id,
                tx.amount,
                tx.vendor,
                tx.raw_text,
                format_datetime(&tx.transaction_date),
            ],
        )?;
        let id = conn.last_insert_rowid();

        let stored = conn.query_row(
            &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
            params![id],
            Self::row_to_transaction,
        )?;
        Ok(stored)
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
                params![id],
                Self::row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// List a user's transactions, newest transaction date first
    pub fn list_transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {}
            FROM transactions
            WHERE user_id = ?
            ORDER BY transaction_date DESC, id DESC
            "#,
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Overwrite a transaction's category (last write wins)
    ///
    /// Returns false when no transaction has this ID.
    pub fn update_transaction_category(&self, id: i64, category: Category) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE transactions SET category = ? WHERE id = ?",
            params![category.as_str(), id],
        )?;
        Ok(updated > 0)
    }

    /// Transactions the classifier has not reached yet (oldest first)
    pub fn list_uncategorized_transactions(&self, limit: i64) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions WHERE category IS NULL ORDER BY id LIMIT ?",
            TRANSACTION_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![limit], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Sum of a user's transaction amounts with `start <= transaction_date <= end`
    ///
    /// Returns 0 when nothing falls inside the window.
    pub fn sum_spending_between(
        &self,
        user_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<i64> {
        let conn = self.conn()?;
        let total: i64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = ? AND transaction_date >= ? AND transaction_date <= ?
            "#,
            params![user_id, format_datetime(&start), format_datetime(&end)],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Count total transactions
    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    pub(crate) fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
        let category_str: Option<String> = row.get(4)?;
        let date_str: String = row.get(6)?;
        let created_at_str: String = row.get(7)?;
        Ok(Transaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            vendor: row.get(3)?,
            category: category_str.map(|s| parse_category(&s)).transpose()?,
            raw_text: row.get(5)?,
            transaction_date: parse_naive_datetime(&date_str)?,
            created_at: parse_datetime(&created_at_str),
        })
    }
}

/// Stored labels must map back to a category
fn parse_category(label: &str) -> rusqlite::Result<Category> {
    label.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })
}
