//! # letsema-core
//!
//! Shared domain types for the Letsema lending platform:
//!
//! - **Branded IDs**: newtype wrappers over UUID v7 strings with entity
//!   prefixes, so a borrower id can never be passed where a loan id is
//!   expected
//! - **Loan status**: the central ledger's status enumeration plus the
//!   payment-event sentinels recorded in the audit trail

#![deny(unsafe_code)]

pub mod ids;
pub mod status;

pub use ids::{BorrowerId, InstitutionId, LoanId, StatusUpdateId};
pub use status::{LoanStatus, PAYMENT_LATE, PAYMENT_RECEIVED};
