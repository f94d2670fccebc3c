//! High-level transactional `LedgerStore` API.
//!
//! Composes repository operations into atomic, loan-centric methods. Every
//! multi-step write runs inside a single `SQLite` transaction — callers
//! never observe a loan without its audit row.
//!
//! Federation into partner clusters deliberately lives one crate up: a
//! decision is a central-ledger fact that must commit whether or not the
//! partner system is reachable.

use letsema_core::{LoanStatus, PAYMENT_LATE, PAYMENT_RECEIVED};
use tracing::info;

use crate::errors::{LedgerError, Result};
use crate::sqlite::connection::{ConnectionConfig, ConnectionPool, PooledConnection};
use crate::sqlite::migrations::run_migrations;
use crate::sqlite::repositories::borrower::BorrowerRepo;
use crate::sqlite::repositories::institution::InstitutionRepo;
use crate::sqlite::repositories::loan::{CreateLoanOptions, DecisionUpdate, LoanRepo};
use crate::sqlite::repositories::status_update::{AppendStatusUpdateOptions, StatusUpdateRepo};
use crate::sqlite::row_types::{LoanRow, StatusUpdateRow};
use crate::sqlite::{new_file, new_in_memory};

/// Options for submitting a new loan application.
pub struct SubmitLoanOptions<'a> {
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
    /// Submitting actor (usually the borrower).
    pub submitted_by: Option<&'a str>,
}

/// Result of submitting a loan application.
#[derive(Debug)]
pub struct SubmitLoanResult {
    /// The created loan (status PENDING).
    pub loan: LoanRow,
    /// The initial audit row.
    pub initial_update: StatusUpdateRow,
}

/// Options for deciding a pending application.
pub struct DecisionOptions<'a> {
    /// Loan to decide.
    pub loan_id: &'a str,
    /// APPROVED or REJECTED — anything else is a validation error.
    pub decision: LoanStatus,
    /// Deciding actor.
    pub decided_by: Option<&'a str>,
    /// Decision notes.
    pub notes: &'a str,
}

/// Result of applying a decision.
#[derive(Debug)]
pub struct DecisionResult {
    /// The loan after the decision.
    pub loan: LoanRow,
    /// The audit row recording the transition.
    pub update: StatusUpdateRow,
}

/// High-level `LedgerStore` wrapping a connection pool and all repositories.
pub struct LedgerStore {
    pool: ConnectionPool,
}

impl LedgerStore {
    /// Create a `LedgerStore` over an existing pool. Runs pending migrations.
    pub fn new(pool: ConnectionPool) -> Result<Self> {
        let store = Self { pool };
        let _ = run_migrations(&*store.conn()?)?;
        Ok(store)
    }

    /// Open an in-memory ledger (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::new(new_in_memory(&ConnectionConfig::default())?)
    }

    /// Open a file-backed ledger.
    pub fn open_file(path: &str, config: &ConnectionConfig) -> Result<Self> {
        Self::new(new_file(path, config)?)
    }

    /// Get a connection from the pool.
    ///
    /// Public so read paths (credit aggregation) can run repository queries
    /// against the same pool.
    pub fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Loan lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Submit a new loan application.
    ///
    /// Atomic: institution/borrower validation, loan insertion, and the
    /// initial audit row all happen in a single transaction. Fails with
    /// [`LedgerError::MissingCluster`] if the owning institution has no
    /// cluster designator — a loan that cannot be federated must not enter
    /// the ledger.
    pub fn submit_loan(&self, opts: &SubmitLoanOptions<'_>) -> Result<SubmitLoanResult> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        // 1. Institution must exist and carry a cluster designator
        let institution = InstitutionRepo::get_by_id(&tx, opts.institution_id)?
            .ok_or_else(|| LedgerError::InstitutionNotFound(opts.institution_id.to_string()))?;
        if institution.cluster_name.is_empty() {
            return Err(LedgerError::MissingCluster {
                institution: institution.id,
            });
        }

        // 2. Borrower must exist
        let _borrower = BorrowerRepo::get_by_id(&tx, opts.borrower_id)?
            .ok_or_else(|| LedgerError::BorrowerNotFound(opts.borrower_id.to_string()))?;

        // 3. Insert loan + initial audit row
        let loan = LoanRepo::create(
            &tx,
            &CreateLoanOptions {
                borrower_id: opts.borrower_id,
                institution_id: opts.institution_id,
                amount: opts.amount,
                purpose: opts.purpose,
                term_months: opts.term_months,
                interest_rate: opts.interest_rate,
            },
        )?;
        let initial_update = StatusUpdateRepo::append(
            &tx,
            &AppendStatusUpdateOptions {
                loan_id: &loan.id,
                old_status: "",
                new_status: LoanStatus::Pending.as_str(),
                updated_by: opts.submitted_by,
                notes: "Loan application submitted",
            },
        )?;

        tx.commit()?;

        info!(loan_id = %loan.id, institution = %institution.code, "loan application submitted");
        Ok(SubmitLoanResult {
            loan,
            initial_update,
        })
    }

    /// Apply a decision to a pending application.
    ///
    /// Validation happens before any side effect: the decision must be
    /// APPROVED or REJECTED, and the loan must currently be PENDING.
    /// Atomic: the status write and the audit row commit together.
    pub fn apply_decision(&self, opts: &DecisionOptions<'_>) -> Result<DecisionResult> {
        if !opts.decision.is_decision() {
            return Err(LedgerError::Validation(format!(
                "decision must be APPROVED or REJECTED, got {}",
                opts.decision
            )));
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let loan = LoanRepo::get_by_id(&tx, opts.loan_id)?
            .ok_or_else(|| LedgerError::LoanNotFound(opts.loan_id.to_string()))?;
        if loan.status != LoanStatus::Pending {
            return Err(LedgerError::Validation(format!(
                "loan {} is {}, only PENDING applications can be decided",
                loan.id, loan.status
            )));
        }

        let _ = LoanRepo::apply_decision(
            &tx,
            &loan.id,
            &DecisionUpdate {
                status: opts.decision,
                decision_by: opts.decided_by,
                notes: opts.notes,
            },
        )?;
        let update = StatusUpdateRepo::append(
            &tx,
            &AppendStatusUpdateOptions {
                loan_id: &loan.id,
                old_status: loan.status.as_str(),
                new_status: opts.decision.as_str(),
                updated_by: opts.decided_by,
                notes: opts.notes,
            },
        )?;

        tx.commit()?;

        let decided = LoanRepo::get_by_id(&conn, &loan.id)?
            .ok_or_else(|| LedgerError::LoanNotFound(loan.id.clone()))?;

        info!(loan_id = %decided.id, decision = %opts.decision, "loan decision applied");
        Ok(DecisionResult {
            loan: decided,
            update,
        })
    }

    /// Record a later lifecycle transition (DISBURSED, REPAID, DEFAULTED…).
    ///
    /// Atomic: status write plus audit row.
    pub fn record_status_transition(
        &self,
        loan_id: &str,
        new_status: LoanStatus,
        actor: Option<&str>,
        notes: &str,
    ) -> Result<DecisionResult> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let loan = LoanRepo::get_by_id(&tx, loan_id)?
            .ok_or_else(|| LedgerError::LoanNotFound(loan_id.to_string()))?;
        let _ = LoanRepo::update_status(&tx, &loan.id, new_status)?;
        let update = StatusUpdateRepo::append(
            &tx,
            &AppendStatusUpdateOptions {
                loan_id: &loan.id,
                old_status: loan.status.as_str(),
                new_status: new_status.as_str(),
                updated_by: actor,
                notes,
            },
        )?;

        tx.commit()?;

        let updated = LoanRepo::get_by_id(&conn, &loan.id)?
            .ok_or_else(|| LedgerError::LoanNotFound(loan.id.clone()))?;
        Ok(DecisionResult {
            loan: updated,
            update,
        })
    }

    /// Record a payment event ([`PAYMENT_RECEIVED`] or [`PAYMENT_LATE`]).
    ///
    /// The loan's lifecycle status is untouched — only an audit row is
    /// appended. These rows feed late-payment counts in credit aggregation.
    pub fn record_payment_event(
        &self,
        loan_id: &str,
        sentinel: &str,
        actor: Option<&str>,
        notes: &str,
    ) -> Result<StatusUpdateRow> {
        if sentinel != PAYMENT_RECEIVED && sentinel != PAYMENT_LATE {
            return Err(LedgerError::Validation(format!(
                "unknown payment sentinel: {sentinel}"
            )));
        }

        let conn = self.conn()?;
        let loan = LoanRepo::get_by_id(&conn, loan_id)?
            .ok_or_else(|| LedgerError::LoanNotFound(loan_id.to_string()))?;
        StatusUpdateRepo::append(
            &conn,
            &AppendStatusUpdateOptions {
                loan_id: &loan.id,
                old_status: loan.status.as_str(),
                new_status: sentinel,
                updated_by: actor,
                notes,
            },
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
