//! Status-update repository — the append-only audit trail.
//!
//! One row is created per status transition (and per payment event, using
//! the sentinel strings). There are deliberately no update or delete
//! methods: audit rows are immutable once written.

use letsema_core::StatusUpdateId;
use rusqlite::{Connection, Row, params};

use crate::errors::Result;
use crate::sqlite::row_types::StatusUpdateRow;

/// Options for appending a status-update row.
pub struct AppendStatusUpdateOptions<'a> {
    /// Loan the transition belongs to.
    pub loan_id: &'a str,
    /// Status before the transition (empty for the initial submission row).
    pub old_status: &'a str,
    /// Status after the transition — a lifecycle status or payment sentinel.
    pub new_status: &'a str,
    /// Actor who made the change.
    pub updated_by: Option<&'a str>,
    /// Free-text notes.
    pub notes: &'a str,
}

/// Status-update repository — stateless, every method takes `&Connection`.
pub struct StatusUpdateRepo;

impl StatusUpdateRepo {
    /// Append an audit row.
    pub fn append(
        conn: &Connection,
        opts: &AppendStatusUpdateOptions<'_>,
    ) -> Result<StatusUpdateRow> {
        let id = StatusUpdateId::new().into_inner();
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO loan_status_updates (id, loan_id, old_status, new_status, updated_by, timestamp, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                opts.loan_id,
                opts.old_status,
                opts.new_status,
                opts.updated_by,
                now,
                opts.notes
            ],
        )?;
        Ok(StatusUpdateRow {
            id,
            loan_id: opts.loan_id.to_string(),
            old_status: opts.old_status.to_string(),
            new_status: opts.new_status.to_string(),
            updated_by: opts.updated_by.map(String::from),
            timestamp: now,
            notes: opts.notes.to_string(),
        })
    }

    /// List a loan's audit trail in chronological order.
    pub fn list_for_loan(conn: &Connection, loan_id: &str) -> Result<Vec<StatusUpdateRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, loan_id, old_status, new_status, updated_by, timestamp, notes
             FROM loan_status_updates WHERE loan_id = ?1 ORDER BY timestamp, id",
        )?;
        let rows = stmt
            .query_map(params![loan_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count a loan's audit rows carrying the given `new_status`.
    ///
    /// Used by credit aggregation to derive repayment and late-payment
    /// counts from the PAYMENT_RECEIVED / PAYMENT_LATE sentinels.
    pub fn count_with_status(conn: &Connection, loan_id: &str, new_status: &str) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM loan_status_updates WHERE loan_id = ?1 AND new_status = ?2",
            params![loan_id, new_status],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count audit rows with the given `new_status` across all of a
    /// borrower's loans.
    pub fn count_for_borrower_with_status(
        conn: &Connection,
        borrower_id: &str,
        new_status: &str,
    ) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM loan_status_updates u
             JOIN loan_applications l ON l.id = u.loan_id
             WHERE l.borrower_id = ?1 AND u.new_status = ?2",
            params![borrower_id, new_status],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<StatusUpdateRow> {
    Ok(StatusUpdateRow {
        id: row.get(0)?,
        loan_id: row.get(1)?,
        old_status: row.get(2)?,
        new_status: row.get(3)?,
        updated_by: row.get(4)?,
        timestamp: row.get(5)?,
        notes: row.get(6)?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
