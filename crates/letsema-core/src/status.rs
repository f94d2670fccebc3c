//! Loan status enumeration and audit-trail sentinels.
//!
//! [`LoanStatus`] covers the central ledger's lifecycle states. The audit
//! trail (`loan_status_updates`) stores free-form status strings so it can
//! also carry payment events that are not lifecycle states — those use the
//! [`PAYMENT_RECEIVED`] / [`PAYMENT_LATE`] sentinels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit sentinel recorded when a repayment arrives on time.
pub const PAYMENT_RECEIVED: &str = "PAYMENT_RECEIVED";

/// Audit sentinel recorded when a repayment is late. Late-payment counts in
/// credit aggregation are derived by counting these rows.
pub const PAYMENT_LATE: &str = "PAYMENT_LATE";

/// Lifecycle status of a central loan application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// Submitted, awaiting a decision.
    Pending,
    /// Approved by the institution; federation into the partner cluster is
    /// attempted on this transition.
    Approved,
    /// Rejected by the institution.
    Rejected,
    /// Funds released to the borrower.
    Disbursed,
    /// Fully repaid (terminal).
    Repaid,
    /// Written off (terminal).
    Defaulted,
}

impl LoanStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Disbursed,
        Self::Repaid,
        Self::Defaulted,
    ];

    /// The SQL/wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Disbursed => "DISBURSED",
            Self::Repaid => "REPAID",
            Self::Defaulted => "DEFAULTED",
        }
    }

    /// Parse the SQL/wire representation. Returns `None` for anything else,
    /// including the payment sentinels.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "DISBURSED" => Some(Self::Disbursed),
            "REPAID" => Some(Self::Repaid),
            "DEFAULTED" => Some(Self::Defaulted),
            _ => None,
        }
    }

    /// Whether the loan has reached a closed state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Repaid | Self::Defaulted)
    }

    /// Whether this status is a valid decision outcome for a pending
    /// application.
    #[must_use]
    pub fn is_decision(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
