//! Credit-history document cache.
//!
//! A document store keyed by national identifier, backed by its own
//! `SQLite` database (the two list fields are stored as JSON text). The
//! cache is authoritative on read: a hit is returned as-is with no
//! staleness check, until a write path explicitly touches the document.
//!
//! Two write paths with deliberately different depth:
//!
//! - **Miss-triggered** ([`CreditCacheStore::get_or_build`]): builds the
//!   full merged view (central + all partner clusters) and persists it.
//! - **Write-triggered** ([`CreditCacheStore::refresh_central`]): recomputes
//!   only the central view and patches the existing document in place —
//!   scalar fields take central-only values, central payment-history
//!   entries are replaced wholesale, partner entries are retained
//!   unduplicated. Partner contributions to the scalars are lost until the
//!   next miss-triggered rebuild.
//!
//! Concurrent population of the same key is an accepted race: last writer
//! wins, and the document is idempotently recomputed from source truth on
//! the next rebuild.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use letsema_partners::PartnerGateway;

use crate::aggregate::{central_credit_view, merged_credit_view};
use crate::errors::{CreditError, Result};
use crate::history::CreditHistory;

/// Alias for the document-store connection pool.
pub type CachePool = Pool<SqliteConnectionManager>;

const CACHE_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS credit_histories (
    national_id     TEXT PRIMARY KEY,
    credit_score    INTEGER NOT NULL,
    active_loans    INTEGER NOT NULL,
    total_debt      REAL NOT NULL,
    payment_history TEXT NOT NULL,
    inquiries       TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);
";

/// Document-store-backed credit-history cache.
pub struct CreditCacheStore {
    pool: CachePool,
}

impl CreditCacheStore {
    /// Create a cache over an existing pool, ensuring the schema exists.
    pub fn new(pool: CachePool) -> Result<Self> {
        let store = Self { pool };
        store.conn()?.execute_batch(CACHE_SCHEMA_SQL)?;
        Ok(store)
    }

    /// Open an in-memory cache (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager)?;
        Self::new(pool)
    }

    /// Open a file-backed cache.
    pub fn open_file(path: &str, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        Self::new(pool)
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Document access
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the cached document for a national identifier.
    pub fn get(&self, national_id: &str) -> Result<Option<CreditHistory>> {
        let conn = self.conn()?;
        get_document(&conn, national_id)
    }

    /// Insert or overwrite a document. On overwrite the original
    /// `created_at` is preserved — the document keeps its identity across
    /// recomputations.
    pub fn upsert(&self, document: &CreditHistory) -> Result<()> {
        let conn = self.conn()?;
        upsert_document(&conn, document)
    }

    /// Count cached documents.
    pub fn count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM credit_histories", [], |row| row.get(0))?;
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read path
    // ─────────────────────────────────────────────────────────────────────

    /// Serve the cached document, building the full merged view on a miss.
    ///
    /// On a hit the document is returned as-is. On a miss the merged view
    /// (central + all partner clusters) is computed; if nothing is
    /// derivable from any source, fails with [`CreditError::NotFound`],
    /// otherwise the new document is persisted and returned.
    pub fn get_or_build(
        &self,
        national_id: &str,
        ledger_conn: &Connection,
        gateway: &PartnerGateway,
    ) -> Result<CreditHistory> {
        if let Some(document) = self.get(national_id)? {
            return Ok(document);
        }

        let document = merged_credit_view(ledger_conn, gateway, national_id)?
            .ok_or_else(|| CreditError::NotFound(national_id.to_string()))?;
        self.upsert(&document)?;
        info!(national_id, score = document.credit_score, "credit history built and cached");
        Ok(document)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Write-triggered refresh
    // ─────────────────────────────────────────────────────────────────────

    /// Refresh the central contribution of a cached document after a loan
    /// or status-update write.
    ///
    /// Recomputes the central-only view. If no document exists yet the
    /// central view is cached as-is; otherwise the document is patched in
    /// place: scalars and inquiries take the central values, central
    /// payment-history entries are replaced with the fresh set, and
    /// partner-origin entries (integer loan refs) are carried over
    /// untouched.
    pub fn refresh_central(&self, ledger_conn: &Connection, national_id: &str) -> Result<()> {
        let Some(central) = central_credit_view(ledger_conn, national_id)? else {
            warn!(national_id, "no central credit data to refresh cache with");
            return Ok(());
        };

        let patched = match self.get(national_id)? {
            None => central,
            Some(existing) => {
                let mut payment_history = central.payment_history;
                payment_history.extend(
                    existing
                        .payment_history
                        .into_iter()
                        .filter(|entry| !entry.loan_id.is_central()),
                );
                CreditHistory {
                    national_id: existing.national_id,
                    credit_score: central.credit_score,
                    active_loans: central.active_loans,
                    total_debt: central.total_debt,
                    payment_history,
                    inquiries: central.inquiries,
                    created_at: existing.created_at,
                    updated_at: central.updated_at,
                }
            }
        };

        self.upsert(&patched)?;
        info!(national_id, score = patched.credit_score, "credit history refreshed from ledger");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal
// ─────────────────────────────────────────────────────────────────────────────

fn get_document(conn: &Connection, national_id: &str) -> Result<Option<CreditHistory>> {
    let raw = conn
        .query_row(
            "SELECT national_id, credit_score, active_loans, total_debt,
                    payment_history, inquiries, created_at, updated_at
             FROM credit_histories WHERE national_id = ?1",
            params![national_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?;

    let Some((national_id, credit_score, active_loans, total_debt, payments, inquiries, created_at, updated_at)) =
        raw
    else {
        return Ok(None);
    };

    Ok(Some(CreditHistory {
        national_id,
        credit_score,
        active_loans,
        total_debt,
        payment_history: serde_json::from_str(&payments)?,
        inquiries: serde_json::from_str(&inquiries)?,
        created_at,
        updated_at,
    }))
}

fn upsert_document(conn: &Connection, document: &CreditHistory) -> Result<()> {
    let payments = serde_json::to_string(&document.payment_history)?;
    let inquiries = serde_json::to_string(&document.inquiries)?;
    let _ = conn.execute(
        "INSERT INTO credit_histories
           (national_id, credit_score, active_loans, total_debt, payment_history, inquiries,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(national_id) DO UPDATE SET
           credit_score    = excluded.credit_score,
           active_loans    = excluded.active_loans,
           total_debt      = excluded.total_debt,
           payment_history = excluded.payment_history,
           inquiries       = excluded.inquiries,
           updated_at      = excluded.updated_at",
        params![
            document.national_id,
            document.credit_score,
            document.active_loans,
            document.total_debt,
            payments,
            inquiries,
            document.created_at,
            document.updated_at,
        ],
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
