//! Error types for the central ledger subsystem.
//!
//! [`LedgerError`] is the primary error type returned by all ledger
//! operations. It provides specific variants for common failure modes while
//! keeping the surface area small enough for exhaustive pattern matching.

use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Requested borrower was not found.
    #[error("borrower not found: {0}")]
    BorrowerNotFound(String),

    /// Requested institution was not found.
    #[error("institution not found: {0}")]
    InstitutionNotFound(String),

    /// Requested loan application was not found.
    #[error("loan not found: {0}")]
    LoanNotFound(String),

    /// The institution has no cluster designator assigned. Loans cannot be
    /// saved against it and federation cannot be routed. Configuration
    /// problem — never retried.
    #[error("institution {institution} has no cluster assigned")]
    MissingCluster {
        /// The offending institution id.
        institution: String,
    },

    /// Business-rule violation, rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for ledger results.
pub type Result<T> = std::result::Result<T, LedgerError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_display() {
        let err = LedgerError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn missing_cluster_display() {
        let err = LedgerError::MissingCluster {
            institution: "mfi_123".into(),
        };
        assert_eq!(err.to_string(), "institution mfi_123 has no cluster assigned");
    }

    #[test]
    fn validation_display() {
        let err = LedgerError::Validation("decision must be APPROVED or REJECTED".into());
        assert!(err.to_string().starts_with("validation error"));
    }

    #[test]
    fn from_rusqlite_error() {
        let err: LedgerError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, LedgerError::Sqlite(_)));
    }
}
