//! Error types for partner cluster operations.
//!
//! The taxonomy mirrors how callers are expected to react:
//! [`PartnerError::ConnectionFailed`] is retryable by the caller (never
//! retried here), [`PartnerError::QueryFailed`] is fatal for the operation,
//! and [`PartnerError::MissingCluster`] is a configuration problem that
//! retrying cannot fix.

use thiserror::Error;

use crate::cluster::Cluster;

/// Errors that can occur during partner cluster operations.
#[derive(Debug, Error)]
pub enum PartnerError {
    /// The cluster has no connection parameters configured. Caller error —
    /// the closed cluster set and the configuration have drifted apart.
    #[error("cluster {0} is not configured")]
    ClusterNotConfigured(Cluster),

    /// The partner database could not be opened. Retryable by the caller.
    #[error("failed to connect to cluster {cluster}: {source}")]
    ConnectionFailed {
        /// The unreachable cluster.
        cluster: Cluster,
        /// The underlying driver error.
        source: rusqlite::Error,
    },

    /// A statement failed on the partner database (malformed SQL or
    /// constraint violation). Fatal for the operation.
    #[error("query failed on cluster {cluster}: {source}")]
    QueryFailed {
        /// The cluster the statement ran against.
        cluster: Cluster,
        /// The underlying driver error.
        source: rusqlite::Error,
    },

    /// A partner row came back with an unexpected shape.
    #[error("unexpected row from cluster {cluster}: {message}")]
    UnexpectedRow {
        /// The cluster the row came from.
        cluster: Cluster,
        /// What was wrong with it.
        message: String,
    },

    /// An institution's cluster designator does not name a known cluster.
    #[error("unknown cluster name: {0}")]
    UnknownCluster(String),

    /// Central-ledger failure while preparing or finishing a partner
    /// operation (includes the missing-cluster configuration error).
    #[error(transparent)]
    Ledger(#[from] letsema_ledger::LedgerError),
}

/// Convenience type alias for partner operation results.
pub type Result<T> = std::result::Result<T, PartnerError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
