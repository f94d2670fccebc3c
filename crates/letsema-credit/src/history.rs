//! Credit-history document types.
//!
//! The document shape matches the cache schema exactly: one document per
//! national identifier, a bounded score, aggregate counts, and the ordered
//! payment-history and inquiry lists.

use serde::{Deserialize, Serialize};

/// Lower bound of the credit-score range.
pub const MIN_SCORE: i64 = 300;

/// Upper bound of the credit-score range.
pub const MAX_SCORE: i64 = 850;

/// Clamp a raw score into the valid range.
#[must_use]
pub fn clamp_score(score: i64) -> i64 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Reference to the loan a payment-history entry derives from.
///
/// Central entries carry the ledger's string id (`loan_…`); partner entries
/// carry the partner system's integer serial. The distinction is what lets
/// a write-triggered refresh replace central entries while retaining
/// partner entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LoanRef {
    /// A central ledger loan id.
    Central(String),
    /// A partner-side serial id.
    Partner(i64),
}

impl LoanRef {
    /// Whether this entry originates from the central ledger.
    #[must_use]
    pub fn is_central(&self) -> bool {
        matches!(self, Self::Central(_))
    }
}

/// One payment-history entry, derived per loan (not per payment).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentHistoryEntry {
    /// The loan this entry derives from.
    pub loan_id: LoanRef,
    /// Principal amount.
    pub amount: f64,
    /// Loan status string in the originating system's vocabulary
    /// (`"APPROVED"` centrally, `"active"` on partners).
    pub status: String,
    /// Application date, if recorded.
    pub application_date: Option<String>,
    /// Approval date, if recorded.
    pub approval_date: Option<String>,
    /// Number of repayments observed.
    pub repayments_count: i64,
    /// Number of late payments observed.
    pub late_payments: i64,
}

/// One credit inquiry entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InquiryEntry {
    /// When the inquiry happened.
    pub date: String,
    /// Who inquired.
    pub inquirer: String,
    /// Stated purpose.
    pub purpose: String,
}

/// A credit-history document, keyed by national identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditHistory {
    /// National identifier (unique document key).
    pub national_id: String,
    /// Combined credit score, clamped to `[MIN_SCORE, MAX_SCORE]`.
    pub credit_score: i64,
    /// Count of currently active loans.
    pub active_loans: i64,
    /// Total outstanding debt across active loans.
    pub total_debt: f64,
    /// Ordered payment-history entries — central first, then each partner
    /// in cluster order.
    pub payment_history: Vec<PaymentHistoryEntry>,
    /// Ordered inquiry entries.
    pub inquiries: Vec<InquiryEntry>,
    /// Document creation timestamp.
    pub created_at: String,
    /// Last recomputation timestamp.
    pub updated_at: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
