//! Partner connection gateway.
//!
//! The single choke point for partner cluster access: every read and write
//! against a partner database goes through [`PartnerGateway::execute`].
//!
//! Connections are deliberately not pooled or reused. Each logical operation
//! opens a connection, issues its statements, and releases it on every exit
//! path — partner databases are owned by the partners, and holding
//! connections open across operations is not ours to decide.
//!
//! The gateway never retries. Callers see [`PartnerError::ConnectionFailed`]
//! or [`PartnerError::QueryFailed`] and decide for themselves; every failure
//! is logged here with the cluster name first.

use rusqlite::types::Value;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, error};

use crate::cluster::Cluster;
use crate::config::PartnerConfig;
use crate::errors::{PartnerError, Result};

/// A row returned from a partner cluster: one dynamically typed value per
/// column.
pub type PartnerRow = Vec<Value>;

/// Gateway over the configured partner clusters.
#[derive(Clone, Debug)]
pub struct PartnerGateway {
    config: PartnerConfig,
}

impl PartnerGateway {
    /// Create a gateway over the given (immutable) configuration.
    #[must_use]
    pub fn new(config: PartnerConfig) -> Self {
        Self { config }
    }

    /// The configuration this gateway was built with.
    #[must_use]
    pub fn config(&self) -> &PartnerConfig {
        &self.config
    }

    /// Execute one statement against a partner cluster and return all rows.
    ///
    /// Statements with a result set (SELECT, INSERT … RETURNING) yield their
    /// rows; plain writes yield an empty vec. The connection is scoped to
    /// this call.
    pub fn execute(&self, cluster: Cluster, sql: &str, params: &[Value]) -> Result<Vec<PartnerRow>> {
        debug!(%cluster, "executing partner statement");
        let conn = self.open(cluster)?;
        let result = run_statement(&conn, cluster, sql, params);
        if let Err(err) = &result {
            error!(%cluster, %err, "partner statement failed");
        }
        result
    }

    fn open(&self, cluster: Cluster) -> Result<Connection> {
        let path = self
            .config
            .db_path(cluster)
            .ok_or(PartnerError::ClusterNotConfigured(cluster))?;
        let conn = Connection::open(path).map_err(|source| {
            error!(%cluster, %source, "partner connection failed");
            PartnerError::ConnectionFailed { cluster, source }
        })?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(|source| {
                error!(%cluster, %source, "partner connection failed");
                PartnerError::ConnectionFailed { cluster, source }
            })?;
        Ok(conn)
    }
}

fn run_statement(
    conn: &Connection,
    cluster: Cluster,
    sql: &str,
    params: &[Value],
) -> Result<Vec<PartnerRow>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|source| PartnerError::QueryFailed { cluster, source })?;
    let column_count = stmt.column_count();
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(row.get::<_, Value>(i)?);
            }
            Ok(values)
        })
        .map_err(|source| PartnerError::QueryFailed { cluster, source })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|source| PartnerError::QueryFailed { cluster, source })?;
    Ok(rows)
}

// ─────────────────────────────────────────────────────────────────────────────
// Row value helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Read a column as an integer.
#[must_use]
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        _ => None,
    }
}

/// Read a column as a float. SQLite sums and literals may surface as
/// integers, so both numeric affinities are accepted.
#[must_use]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Real(f) => Some(*f),
        #[allow(clippy::cast_precision_loss)]
        Value::Integer(n) => Some(*n as f64),
        _ => None,
    }
}

/// Read a column as text. NULL yields `None`.
#[must_use]
pub fn value_as_text(value: &Value) -> Option<&str> {
    match value {
        Value::Text(s) => Some(s),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
