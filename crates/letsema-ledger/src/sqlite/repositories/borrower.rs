//! Borrower repository — CRUD for the `borrowers` table.
//!
//! Borrowers are the central identity record. The `national_id` column is
//! the key used to reconcile identity against partner clusters.

use letsema_core::BorrowerId;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;
use crate::sqlite::row_types::BorrowerRow;

/// Options for creating a new borrower.
pub struct CreateBorrowerOptions<'a> {
    /// Full legal name.
    pub full_name: &'a str,
    /// Email address (must be unique).
    pub email: &'a str,
    /// Phone number.
    pub phone: &'a str,
    /// National identifier (must be unique).
    pub national_id: &'a str,
    /// Central credit score, if known.
    pub credit_score: Option<i64>,
}

/// Borrower repository — stateless, every method takes `&Connection`.
pub struct BorrowerRepo;

impl BorrowerRepo {
    /// Create a new borrower.
    pub fn create(conn: &Connection, opts: &CreateBorrowerOptions<'_>) -> Result<BorrowerRow> {
        let id = BorrowerId::new().into_inner();
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO borrowers (id, full_name, email, phone, national_id, credit_score, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                opts.full_name,
                opts.email,
                opts.phone,
                opts.national_id,
                opts.credit_score,
                now,
                now
            ],
        )?;
        Ok(BorrowerRow {
            id,
            full_name: opts.full_name.to_string(),
            email: opts.email.to_string(),
            phone: opts.phone.to_string(),
            national_id: opts.national_id.to_string(),
            credit_score: opts.credit_score,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get borrower by ID.
    pub fn get_by_id(conn: &Connection, borrower_id: &str) -> Result<Option<BorrowerRow>> {
        let row = conn
            .query_row(
                &format!("{SELECT_SQL} WHERE id = ?1"),
                params![borrower_id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Get borrower by national identifier.
    pub fn get_by_national_id(conn: &Connection, national_id: &str) -> Result<Option<BorrowerRow>> {
        let row = conn
            .query_row(
                &format!("{SELECT_SQL} WHERE national_id = ?1"),
                params![national_id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List all borrowers ordered by creation time.
    pub fn list(conn: &Connection) -> Result<Vec<BorrowerRow>> {
        let mut stmt = conn.prepare(&format!("{SELECT_SQL} ORDER BY created_at"))?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Update the central credit score. Returns `true` if a row changed.
    pub fn update_credit_score(
        conn: &Connection,
        borrower_id: &str,
        credit_score: Option<i64>,
    ) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE borrowers SET credit_score = ?1, updated_at = ?2 WHERE id = ?3",
            params![credit_score, now, borrower_id],
        )?;
        Ok(changed > 0)
    }

    /// Count total borrowers.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM borrowers", [], |row| row.get(0))?;
        Ok(count)
    }
}

const SELECT_SQL: &str = "SELECT id, full_name, email, phone, national_id, credit_score, \
                          created_at, updated_at FROM borrowers";

fn map_row(row: &Row<'_>) -> rusqlite::Result<BorrowerRow> {
    Ok(BorrowerRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        national_id: row.get(4)?,
        credit_score: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
            .unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn opts<'a>(email: &'a str, national_id: &'a str) -> CreateBorrowerOptions<'a> {
        CreateBorrowerOptions {
            full_name: "Thabo Mokoena",
            email,
            phone: "+26650000000",
            national_id,
            credit_score: None,
        }
    }

    #[test]
    fn create_borrower() {
        let conn = setup();
        let b = BorrowerRepo::create(&conn, &opts("t@x.com", "N100")).unwrap();
        assert!(b.id.starts_with("bor_"));
        assert_eq!(b.national_id, "N100");
        assert!(b.credit_score.is_none());
    }

    #[test]
    fn duplicate_national_id_fails() {
        let conn = setup();
        BorrowerRepo::create(&conn, &opts("a@x.com", "N100")).unwrap();
        let dup = BorrowerRepo::create(&conn, &opts("b@x.com", "N100"));
        assert!(dup.is_err());
    }

    #[test]
    fn get_by_national_id() {
        let conn = setup();
        let b = BorrowerRepo::create(&conn, &opts("t@x.com", "TEST123")).unwrap();
        let found = BorrowerRepo::get_by_national_id(&conn, "TEST123")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, b.id);
    }

    #[test]
    fn get_by_national_id_not_found() {
        let conn = setup();
        assert!(
            BorrowerRepo::get_by_national_id(&conn, "NOPE")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn update_credit_score() {
        let conn = setup();
        let b = BorrowerRepo::create(&conn, &opts("t@x.com", "N1")).unwrap();
        assert!(BorrowerRepo::update_credit_score(&conn, &b.id, Some(720)).unwrap());
        let updated = BorrowerRepo::get_by_id(&conn, &b.id).unwrap().unwrap();
        assert_eq!(updated.credit_score, Some(720));
    }

    #[test]
    fn list_and_count() {
        let conn = setup();
        assert_eq!(BorrowerRepo::count(&conn).unwrap(), 0);
        BorrowerRepo::create(&conn, &opts("a@x.com", "N1")).unwrap();
        BorrowerRepo::create(&conn, &opts("b@x.com", "N2")).unwrap();
        assert_eq!(BorrowerRepo::count(&conn).unwrap(), 2);
        assert_eq!(BorrowerRepo::list(&conn).unwrap().len(), 2);
    }
}
