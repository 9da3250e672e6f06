//! Beta tester operations

use rusqlite::params;

use super::{is_unique_violation, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewTester, Tester};

const TESTER_COLUMNS: &str = "id, email, name, notified, created_at";

impl Database {
    /// Register a tester; an already registered email is rejected, never upserted
    pub fn register_tester(&self, tester: &NewTester) -> Result<Tester> {
        tester.validate()?;
        let email = tester.email.trim();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO testers (email, name) VALUES (?, ?)",
            params![email, tester.name.trim()],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!("Email already registered: {}", email))
            } else {
                Error::Database(e)
            }
        })?;
        let id = conn.last_insert_rowid();

        let stored = conn.query_row(
            &format!("SELECT {} FROM testers WHERE id = ?", TESTER_COLUMNS),
            params![id],
            Self::row_to_tester,
        )?;
        Ok(stored)
    }

    /// All testers, newest registration first
    pub fn list_testers(&self) -> Result<Vec<Tester>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM testers ORDER BY created_at DESC, id DESC",
            TESTER_COLUMNS
        ))?;
        let testers = stmt
            .query_map([], Self::row_to_tester)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(testers)
    }

    /// Registered emails, oldest registration first
    pub fn list_tester_emails(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT email FROM testers ORDER BY created_at, id")?;
        let emails = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(emails)
    }

    /// Testers the operator has not been told about yet (oldest first)
    pub fn list_unnotified_testers(&self) -> Result<Vec<Tester>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM testers WHERE notified = 0 ORDER BY created_at, id",
            TESTER_COLUMNS
        ))?;
        let testers = stmt
            .query_map([], Self::row_to_tester)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(testers)
    }

    /// Mark exactly these testers as notified, atomically
    ///
    /// Returns how many rows flipped from unnotified to notified.
    pub fn mark_testers_notified(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut flipped = 0;
        {
            let mut stmt =
                tx.prepare("UPDATE testers SET notified = 1 WHERE id = ? AND notified = 0")?;
            for id in ids {
                flipped += stmt.execute(params![id])?;
            }
        }
        tx.commit()?;

        Ok(flipped)
    }

    /// Count testers as (total, still waiting for notification)
    pub fn count_testers(&self) -> Result<(i64, i64)> {
        let conn = self.conn()?;
        let counts = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN notified = 0 THEN 1 ELSE 0 END), 0) FROM testers",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(counts)
    }

    fn row_to_tester(row: &rusqlite::Row) -> rusqlite::Result<Tester> {
        let notified: i64 = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        Ok(Tester {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            notified: notified != 0,
            created_at: parse_datetime(&created_at_str),
        })
    }
}
