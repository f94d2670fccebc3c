//! Error types for credit aggregation and the document cache.

use thiserror::Error;

/// Errors that can occur during credit aggregation or cache operations.
#[derive(Debug, Error)]
pub enum CreditError {
    /// `SQLite` error on the document store.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Document-store connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Document (de)serialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Central-ledger failure while computing a view.
    #[error(transparent)]
    Ledger(#[from] letsema_ledger::LedgerError),

    /// Partner-cluster failure while computing a view.
    #[error(transparent)]
    Partner(#[from] letsema_partners::PartnerError),

    /// No credit data is derivable from any source for this identifier —
    /// the user-visible 404 equivalent.
    #[error("no credit history for national id: {0}")]
    NotFound(String),
}

/// Convenience type alias for credit results.
pub type Result<T> = std::result::Result<T, CreditError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
