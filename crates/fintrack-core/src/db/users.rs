//! User operations

use rusqlite::{params, OptionalExtension};

use super::{is_unique_violation, Database};
use crate::error::{Error, Result};
use crate::models::{NewUser, User};

impl Database {
    /// Create a user; a taken `user_id` is a conflict
    pub fn create_user(&self, user: &NewUser) -> Result<User> {
        if user.user_id.trim().is_empty() {
            return Err(Error::Validation("user_id must not be empty".into()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (user_id, name, monthly_budget, fixed_expenses) VALUES (?, ?, ?, ?)",
            params![
                user.user_id,
                user.name,
                user.monthly_budget,
                user.fixed_expenses
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!("User already exists: {}", user.user_id))
            } else {
                Error::Database(e)
            }
        })?;

        Ok(User {
            id: conn.last_insert_rowid(),
            user_id: user.user_id.clone(),
            name: user.name.clone(),
            monthly_budget: user.monthly_budget,
            fixed_expenses: user.fixed_expenses,
        })
    }

    /// Look a user up by their external `user_id`
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, user_id, name, monthly_budget, fixed_expenses FROM users WHERE user_id = ?",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        monthly_budget: row.get(3)?,
                        fixed_expenses: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Like `get_user`, but a missing user is `Error::NotFound`
    pub fn require_user(&self, user_id: &str) -> Result<User> {
        self.get_user(user_id)?
            .ok_or_else(|| Error::NotFound(format!("User not found: {}", user_id)))
    }

    /// Set a user's monthly budget and/or fixed expenses
    pub fn update_user_budget(
        &self,
        user_id: &str,
        monthly_budget: Option<i64>,
        fixed_expenses: Option<i64>,
    ) -> Result<User> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE users
            SET monthly_budget = COALESCE(?, monthly_budget),
                fixed_expenses = COALESCE(?, fixed_expenses)
            WHERE user_id = ?
            "#,
            params![monthly_budget, fixed_expenses, user_id],
        )?;
        drop(conn);

        if updated == 0 {
            return Err(Error::NotFound(format!("User not found: {}", user_id)));
        }
        self.require_user(user_id)
    }
}
