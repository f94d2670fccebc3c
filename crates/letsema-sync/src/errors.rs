//! Error types for lifecycle orchestration.
//!
//! Orchestration composes the three subsystems, so its error is a thin sum
//! over their error types — each keeps its own context (cluster,
//! identifier, operation) intact.

use thiserror::Error;

/// Errors surfaced by lifecycle orchestration.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Central-ledger failure (includes validation and configuration
    /// errors).
    #[error(transparent)]
    Ledger(#[from] letsema_ledger::LedgerError),

    /// Partner-cluster failure (connection, query, identity, federation).
    #[error(transparent)]
    Partner(#[from] letsema_partners::PartnerError),

    /// Credit aggregation or cache failure.
    #[error(transparent)]
    Credit(#[from] letsema_credit::CreditError),
}

/// Convenience type alias for orchestration results.
pub type Result<T> = std::result::Result<T, SyncError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
