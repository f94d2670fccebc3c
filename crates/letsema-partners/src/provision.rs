//! Partner schema bootstrap for locally hosted clusters.
//!
//! Partner schemas are owned by the partners — in production the tables
//! already exist and this module is never called. It exists for development
//! environments and tests, creating the fixed three-table contract the
//! gateway depends on (`borrowers`, `loans`, `repayments`).

use rusqlite::Connection;
use tracing::info;

use crate::cluster::Cluster;
use crate::config::PartnerConfig;
use crate::errors::{PartnerError, Result};

/// The fixed partner-side schema contract.
const PARTNER_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS borrowers (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    email        TEXT NOT NULL,
    phone        TEXT NOT NULL DEFAULT '',
    national_id  TEXT NOT NULL,
    credit_score INTEGER NOT NULL DEFAULT 650,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS loans (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    borrower_id        INTEGER NOT NULL REFERENCES borrowers(id),
    amount             REAL NOT NULL,
    interest_rate      REAL NOT NULL,
    status             TEXT NOT NULL,
    purpose            TEXT NOT NULL DEFAULT '',
    application_date   TEXT,
    approval_date      TEXT,
    term_months        INTEGER NOT NULL,
    external_reference TEXT
);

CREATE TABLE IF NOT EXISTS repayments (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    loan_id      INTEGER NOT NULL REFERENCES loans(id),
    amount       REAL NOT NULL,
    status       TEXT NOT NULL,
    payment_date TEXT
);

CREATE INDEX IF NOT EXISTS idx_partner_borrowers_national_id ON borrowers(national_id);
CREATE INDEX IF NOT EXISTS idx_partner_loans_borrower ON loans(borrower_id);
CREATE INDEX IF NOT EXISTS idx_partner_loans_reference ON loans(external_reference);
CREATE INDEX IF NOT EXISTS idx_partner_repayments_loan ON repayments(loan_id);
";

/// Create the partner schema in the configured cluster database.
///
/// Idempotent — all statements are `IF NOT EXISTS`.
pub fn provision_cluster(config: &PartnerConfig, cluster: Cluster) -> Result<()> {
    let path = config
        .db_path(cluster)
        .ok_or(PartnerError::ClusterNotConfigured(cluster))?;
    let conn = Connection::open(path)
        .map_err(|source| PartnerError::ConnectionFailed { cluster, source })?;
    conn.execute_batch(PARTNER_SCHEMA_SQL)
        .map_err(|source| PartnerError::QueryFailed { cluster, source })?;
    info!(%cluster, path, "partner schema provisioned");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
