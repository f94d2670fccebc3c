//! Database row types for mapping between `SQLite` rows and Rust structs.
//!
//! These represent the raw database row shape — conversion to/from the
//! typed [`LoanStatus`] happens in the repository layer during mapping.

use letsema_core::LoanStatus;
use serde::{Deserialize, Serialize};

/// Raw borrower row from the `borrowers` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BorrowerRow {
    /// Borrower ID (`bor_…`).
    pub id: String,
    /// Full legal name.
    pub full_name: String,
    /// Email address (unique).
    pub email: String,
    /// Phone number (may be empty).
    pub phone: String,
    /// National identifier (unique) — the identity-resolution key across
    /// partner systems.
    pub national_id: String,
    /// Central credit score, if one has been recorded.
    pub credit_score: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Raw institution row from the `institutions` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstitutionRow {
    /// Institution ID (`mfi_…`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Unique short code.
    pub code: String,
    /// Free-text description.
    pub description: String,
    /// Partner cluster designator ("mfi_a" / "mfi_b"); empty means the
    /// institution is not yet wired to a partner database.
    pub cluster_name: String,
    /// Optional REST endpoint.
    pub api_endpoint: Option<String>,
    /// Whether the institution is active.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// Raw loan application row from the `loan_applications` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoanRow {
    /// Loan ID (`loan_…`).
    pub id: String,
    /// Borrower ID.
    pub borrower_id: String,
    /// Institution ID.
    pub institution_id: String,
    /// Principal amount.
    pub amount: f64,
    /// Stated purpose.
    pub purpose: String,
    /// Term in months.
    pub term_months: i64,
    /// Annual interest rate (percent).
    pub interest_rate: f64,
    /// Lifecycle status.
    pub status: LoanStatus,
    /// Application timestamp.
    pub application_date: String,
    /// Decision timestamp (null while pending).
    pub decision_date: Option<String>,
    /// Deciding actor id (null while pending).
    pub decision_by: Option<String>,
    /// Free-text notes.
    pub notes: String,
    /// Partner-assigned loan id, set iff federation succeeded after
    /// approval.
    pub external_loan_id: Option<String>,
}

/// Raw status-update row from the `loan_status_updates` table.
///
/// Append-only audit entry — the repository exposes no update or delete.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusUpdateRow {
    /// Status update ID (`lsu_…`).
    pub id: String,
    /// Loan ID.
    pub loan_id: String,
    /// Status before the transition (empty for the initial submission row).
    pub old_status: String,
    /// Status after the transition — a [`LoanStatus`] string or a payment
    /// sentinel.
    pub new_status: String,
    /// Actor who made the change.
    pub updated_by: Option<String>,
    /// Transition timestamp.
    pub timestamp: String,
    /// Free-text notes.
    pub notes: String,
}
