//! # letsema-ledger
//!
//! Central ledger `SQLite` backend for the Letsema lending platform.
//!
//! Responsible for:
//!
//! - **Borrowers / institutions / loans / status updates**: the relational
//!   source of truth, with the append-only audit trail
//! - **`SQLite` backend**: `rusqlite` facade with repository pattern
//!   (borrower, institution, loan, status update)
//! - **`LedgerStore`**: transactional facade for submission, decisions,
//!   lifecycle transitions, and payment events
//! - **Migrations**: version-tracked SQL schema evolution

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{LedgerError, Result};
pub use sqlite::row_types::{BorrowerRow, InstitutionRow, LoanRow, StatusUpdateRow};
pub use store::{
    DecisionOptions, DecisionResult, LedgerStore, SubmitLoanOptions, SubmitLoanResult,
};
