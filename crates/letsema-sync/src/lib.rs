//! # letsema-sync
//!
//! Loan-lifecycle orchestration for the Letsema lending platform.
//!
//! This is the layer the external handlers invoke: application submission,
//! decisions (with federation on approval), lifecycle transitions, payment
//! events, and credit-history reads — plus the operational sweeps
//! (reconciliation of unfederated approvals, bulk backfills).

#![deny(unsafe_code)]

pub mod backfill;
pub mod errors;
pub mod reconcile;
pub mod service;

pub use backfill::{BackfillSummary, backfill_credit_histories, sync_borrowers};
pub use errors::{Result, SyncError};
pub use reconcile::{ReconcileSummary, reconcile_unfederated};
pub use service::LifecycleService;
