//! Loan application repository — CRUD for the `loan_applications` table.
//!
//! Status transitions and the cluster-designator guard are enforced one
//! layer up in [`crate::store::LedgerStore`]; this layer is plain SQL.

use letsema_core::{LoanId, LoanStatus};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;
use crate::sqlite::row_types::LoanRow;

/// Options for creating a new loan application.
pub struct CreateLoanOptions<'a> {
    /// Borrower ID.
    pub borrower_id: &'a str,
    /// Institution ID.
    pub institution_id: &'a str,
    /// Principal amount.
    pub amount: f64,
    /// Stated purpose.
    pub purpose: &'a str,
    /// Term in months.
    pub term_months: i64,
    /// Annual interest rate (percent).
    pub interest_rate: f64,
}

/// Fields written when a decision is applied.
pub struct DecisionUpdate<'a> {
    /// The decision outcome (APPROVED or REJECTED).
    pub status: LoanStatus,
    /// Deciding actor id.
    pub decision_by: Option<&'a str>,
    /// Decision notes.
    pub notes: &'a str,
}

/// Loan repository — stateless, every method takes `&Connection`.
pub struct LoanRepo;

impl LoanRepo {
    /// Insert a new loan application with status PENDING.
    pub fn create(conn: &Connection, opts: &CreateLoanOptions<'_>) -> Result<LoanRow> {
        let id = LoanId::new().into_inner();
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO loan_applications
               (id, borrower_id, institution_id, amount, purpose, term_months, interest_rate,
                status, application_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                opts.borrower_id,
                opts.institution_id,
                opts.amount,
                opts.purpose,
                opts.term_months,
                opts.interest_rate,
                LoanStatus::Pending.as_str(),
                now
            ],
        )?;
        Ok(LoanRow {
            id,
            borrower_id: opts.borrower_id.to_string(),
            institution_id: opts.institution_id.to_string(),
            amount: opts.amount,
            purpose: opts.purpose.to_string(),
            term_months: opts.term_months,
            interest_rate: opts.interest_rate,
            status: LoanStatus::Pending,
            application_date: now,
            decision_date: None,
            decision_by: None,
            notes: String::new(),
            external_loan_id: None,
        })
    }

    /// Get loan by ID.
    pub fn get_by_id(conn: &Connection, loan_id: &str) -> Result<Option<LoanRow>> {
        let row = conn
            .query_row(
                &format!("{SELECT_SQL} WHERE id = ?1"),
                params![loan_id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List a borrower's applications, most recent first.
    pub fn list_by_borrower(conn: &Connection, borrower_id: &str) -> Result<Vec<LoanRow>> {
        let mut stmt = conn.prepare(&format!(
            "{SELECT_SQL} WHERE borrower_id = ?1 ORDER BY application_date DESC"
        ))?;
        let rows = stmt
            .query_map(params![borrower_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// List an institution's applications, most recent first.
    pub fn list_by_institution(conn: &Connection, institution_id: &str) -> Result<Vec<LoanRow>> {
        let mut stmt = conn.prepare(&format!(
            "{SELECT_SQL} WHERE institution_id = ?1 ORDER BY application_date DESC"
        ))?;
        let rows = stmt
            .query_map(params![institution_id], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// APPROVED loans whose federation never completed (`external_loan_id`
    /// still NULL). This is the reconciliation work list.
    pub fn list_unfederated(conn: &Connection) -> Result<Vec<LoanRow>> {
        let mut stmt = conn.prepare(&format!(
            "{SELECT_SQL} WHERE status = ?1 AND external_loan_id IS NULL ORDER BY application_date"
        ))?;
        let rows = stmt
            .query_map(params![LoanStatus::Approved.as_str()], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Apply a decision: status, decision timestamp, actor, and notes.
    /// Returns `true` if a row changed.
    pub fn apply_decision(
        conn: &Connection,
        loan_id: &str,
        update: &DecisionUpdate<'_>,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE loan_applications
             SET status = ?1, decision_date = ?2, decision_by = ?3, notes = ?4
             WHERE id = ?5",
            params![
                update.status.as_str(),
                now,
                update.decision_by,
                update.notes,
                loan_id
            ],
        )?;
        Ok(changed > 0)
    }

    /// Set only the lifecycle status. Returns `true` if a row changed.
    pub fn update_status(conn: &Connection, loan_id: &str, status: LoanStatus) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE loan_applications SET status = ?1 WHERE id = ?2",
            params![status.as_str(), loan_id],
        )?;
        Ok(changed > 0)
    }

    /// Persist the partner-assigned loan id after federation.
    /// Returns `true` if a row changed.
    pub fn set_external_loan_id(
        conn: &Connection,
        loan_id: &str,
        external_loan_id: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE loan_applications SET external_loan_id = ?1 WHERE id = ?2",
            params![external_loan_id, loan_id],
        )?;
        Ok(changed > 0)
    }
}

const SELECT_SQL: &str = "SELECT id, borrower_id, institution_id, amount, purpose, term_months, \
                          interest_rate, status, application_date, decision_date, decision_by, \
                          notes, external_loan_id FROM loan_applications";

fn map_row(row: &Row<'_>) -> rusqlite::Result<LoanRow> {
    let status_str: String = row.get(7)?;
    let status = LoanStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("unknown loan status: {status_str}").into(),
        )
    })?;
    Ok(LoanRow {
        id: row.get(0)?,
        borrower_id: row.get(1)?,
        institution_id: row.get(2)?,
        amount: row.get(3)?,
        purpose: row.get(4)?,
        term_months: row.get(5)?,
        interest_rate: row.get(6)?,
        status,
        application_date: row.get(8)?,
        decision_date: row.get(9)?,
        decision_by: row.get(10)?,
        notes: row.get(11)?,
        external_loan_id: row.get(12)?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
