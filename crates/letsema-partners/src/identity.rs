//! Identity resolution between the central ledger and partner clusters.
//!
//! Central and partner systems share no primary keys. A borrower is matched
//! by email or national identifier; when absent, a partner-side borrower
//! row is created from the central profile. Repeated calls return the same
//! partner id — idempotence comes from the check-before-insert, not from a
//! constraint.
//!
//! Known risk: the partner schema has no uniqueness constraint on email or
//! national_id, and the check-then-insert is not atomic. Concurrent
//! first-time resolutions for the same borrower can create duplicate
//! partner rows; `LIMIT 1` then picks one arbitrarily. Fixing this needs a
//! partner-side unique constraint plus upsert, or an advisory lock.

use rusqlite::types::Value;
use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::errors::{PartnerError, Result};
use crate::gateway::{PartnerGateway, value_as_i64};

/// Credit score assigned to partner-side borrowers created from a central
/// profile that has none.
pub const DEFAULT_PARTNER_CREDIT_SCORE: i64 = 650;

/// The central borrower fields copied into a partner cluster.
#[derive(Clone, Debug)]
pub struct BorrowerIdentity<'a> {
    /// Full legal name.
    pub name: &'a str,
    /// Email address.
    pub email: &'a str,
    /// Phone number.
    pub phone: &'a str,
    /// National identifier.
    pub national_id: &'a str,
    /// Central credit score, if one exists.
    pub credit_score: Option<i64>,
}

/// Find the partner-side borrower id for a central identity, creating the
/// partner row if it does not exist. Returns the partner serial id.
pub fn resolve_or_create_borrower(
    gateway: &PartnerGateway,
    cluster: Cluster,
    identity: &BorrowerIdentity<'_>,
) -> Result<i64> {
    if let Some(id) = find_borrower(gateway, cluster, identity)? {
        debug!(%cluster, national_id = identity.national_id, partner_borrower_id = id,
               "borrower already present in partner cluster");
        return Ok(id);
    }

    let now = chrono::Utc::now().to_rfc3339();
    let score = identity
        .credit_score
        .unwrap_or(DEFAULT_PARTNER_CREDIT_SCORE);
    let rows = gateway.execute(
        cluster,
        "INSERT INTO borrowers (name, email, phone, national_id, credit_score, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
        &[
            Value::Text(identity.name.to_string()),
            Value::Text(identity.email.to_string()),
            Value::Text(identity.phone.to_string()),
            Value::Text(identity.national_id.to_string()),
            Value::Integer(score),
            Value::Text(now.clone()),
            Value::Text(now),
        ],
    )?;
    let id = first_id(cluster, &rows)?;

    info!(%cluster, national_id = identity.national_id, partner_borrower_id = id,
          "created borrower in partner cluster");
    Ok(id)
}

/// Look up a partner borrower by email or national identifier. First match
/// wins — at most one is expected but not enforced.
pub fn find_borrower(
    gateway: &PartnerGateway,
    cluster: Cluster,
    identity: &BorrowerIdentity<'_>,
) -> Result<Option<i64>> {
    let rows = gateway.execute(
        cluster,
        "SELECT id FROM borrowers WHERE email = ?1 OR national_id = ?2 LIMIT 1",
        &[
            Value::Text(identity.email.to_string()),
            Value::Text(identity.national_id.to_string()),
        ],
    )?;
    rows.first()
        .map(|row| first_cell_id(cluster, row))
        .transpose()
}

fn first_id(cluster: Cluster, rows: &[Vec<Value>]) -> Result<i64> {
    rows.first()
        .ok_or_else(|| PartnerError::UnexpectedRow {
            cluster,
            message: "insert returned no id".to_string(),
        })
        .and_then(|row| first_cell_id(cluster, row))
}

fn first_cell_id(cluster: Cluster, row: &[Value]) -> Result<i64> {
    row.first()
        .and_then(value_as_i64)
        .ok_or_else(|| PartnerError::UnexpectedRow {
            cluster,
            message: "id column is not an integer".to_string(),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
