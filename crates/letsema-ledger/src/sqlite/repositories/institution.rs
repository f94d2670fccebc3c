//! Institution repository — CRUD for the `institutions` table.
//!
//! The `cluster_name` column routes federation and partner-side credit
//! queries to the right cluster. An empty designator is representable (a
//! freshly registered institution), but loans cannot be saved against it.

use letsema_core::InstitutionId;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::errors::Result;
use crate::sqlite::row_types::InstitutionRow;

/// Options for creating a new institution.
pub struct CreateInstitutionOptions<'a> {
    /// Human-readable name.
    pub name: &'a str,
    /// Unique short code.
    pub code: &'a str,
    /// Free-text description.
    pub description: &'a str,
    /// Partner cluster designator (may be empty while unwired).
    pub cluster_name: &'a str,
    /// Optional REST endpoint.
    pub api_endpoint: Option<&'a str>,
}

/// Institution repository — stateless, every method takes `&Connection`.
pub struct InstitutionRepo;

impl InstitutionRepo {
    /// Create a new institution (active by default).
    pub fn create(conn: &Connection, opts: &CreateInstitutionOptions<'_>) -> Result<InstitutionRow> {
        let id = InstitutionId::new().into_inner();
        let now = chrono::Utc::now().to_rfc3339();
        let _ = conn.execute(
            "INSERT INTO institutions (id, name, code, description, cluster_name, api_endpoint, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
            params![
                id,
                opts.name,
                opts.code,
                opts.description,
                opts.cluster_name,
                opts.api_endpoint,
                now
            ],
        )?;
        Ok(InstitutionRow {
            id,
            name: opts.name.to_string(),
            code: opts.code.to_string(),
            description: opts.description.to_string(),
            cluster_name: opts.cluster_name.to_string(),
            api_endpoint: opts.api_endpoint.map(String::from),
            is_active: true,
            created_at: now,
        })
    }

    /// Get institution by ID.
    pub fn get_by_id(conn: &Connection, institution_id: &str) -> Result<Option<InstitutionRow>> {
        let row = conn
            .query_row(
                &format!("{SELECT_SQL} WHERE id = ?1"),
                params![institution_id],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Get institution by its unique code.
    pub fn get_by_code(conn: &Connection, code: &str) -> Result<Option<InstitutionRow>> {
        let row = conn
            .query_row(
                &format!("{SELECT_SQL} WHERE code = ?1"),
                params![code],
                map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// List active institutions ordered by name.
    pub fn list_active(conn: &Connection) -> Result<Vec<InstitutionRow>> {
        let mut stmt = conn.prepare(&format!("{SELECT_SQL} WHERE is_active = 1 ORDER BY name"))?;
        let rows = stmt
            .query_map([], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Update the cluster designator. Returns `true` if a row changed.
    pub fn update_cluster_name(
        conn: &Connection,
        institution_id: &str,
        cluster_name: &str,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE institutions SET cluster_name = ?1 WHERE id = ?2",
            params![cluster_name, institution_id],
        )?;
        Ok(changed > 0)
    }

    /// Deactivate an institution. Returns `true` if a row changed.
    pub fn deactivate(conn: &Connection, institution_id: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE institutions SET is_active = 0 WHERE id = ?1",
            params![institution_id],
        )?;
        Ok(changed > 0)
    }
}

const SELECT_SQL: &str = "SELECT id, name, code, description, cluster_name, api_endpoint, \
                          is_active, created_at FROM institutions";

fn map_row(row: &Row<'_>) -> rusqlite::Result<InstitutionRow> {
    Ok(InstitutionRow {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        cluster_name: row.get(4)?,
        api_endpoint: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
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

    #[test]
    fn create_institution() {
        let conn = setup();
        let mfi = InstitutionRepo::create(
            &conn,
            &CreateInstitutionOptions {
                name: "Basotho Finance",
                code: "MFI_A",
                description: "Rural lending",
                cluster_name: "mfi_a",
                api_endpoint: None,
            },
        )
        .unwrap();
        assert!(mfi.id.starts_with("mfi_"));
        assert!(mfi.is_active);
        assert_eq!(mfi.cluster_name, "mfi_a");
    }

    #[test]
    fn duplicate_code_fails() {
        let conn = setup();
        let opts = CreateInstitutionOptions {
            name: "A",
            code: "MFI_A",
            description: "",
            cluster_name: "mfi_a",
            api_endpoint: None,
        };
        InstitutionRepo::create(&conn, &opts).unwrap();
        assert!(InstitutionRepo::create(&conn, &opts).is_err());
    }

    #[test]
    fn get_by_code() {
        let conn = setup();
        let mfi = InstitutionRepo::create(
            &conn,
            &CreateInstitutionOptions {
                name: "A",
                code: "MFI_A",
                description: "",
                cluster_name: "mfi_a",
                api_endpoint: Some("https://mfi-a.example/api"),
            },
        )
        .unwrap();
        let found = InstitutionRepo::get_by_code(&conn, "MFI_A").unwrap().unwrap();
        assert_eq!(found.id, mfi.id);
        assert_eq!(found.api_endpoint.as_deref(), Some("https://mfi-a.example/api"));
    }

    #[test]
    fn update_cluster_name() {
        let conn = setup();
        let mfi = InstitutionRepo::create(
            &conn,
            &CreateInstitutionOptions {
                name: "A",
                code: "MFI_A",
                description: "",
                cluster_name: "",
                api_endpoint: None,
            },
        )
        .unwrap();
        assert!(InstitutionRepo::update_cluster_name(&conn, &mfi.id, "mfi_b").unwrap());
        let updated = InstitutionRepo::get_by_id(&conn, &mfi.id).unwrap().unwrap();
        assert_eq!(updated.cluster_name, "mfi_b");
    }

    #[test]
    fn deactivate_removes_from_active_list() {
        let conn = setup();
        let mfi = InstitutionRepo::create(
            &conn,
            &CreateInstitutionOptions {
                name: "A",
                code: "MFI_A",
                description: "",
                cluster_name: "mfi_a",
                api_endpoint: None,
            },
        )
        .unwrap();
        assert_eq!(InstitutionRepo::list_active(&conn).unwrap().len(), 1);
        assert!(InstitutionRepo::deactivate(&conn, &mfi.id).unwrap());
        assert!(InstitutionRepo::list_active(&conn).unwrap().is_empty());
    }
}
