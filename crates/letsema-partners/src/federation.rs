//! Loan federation: mirroring an approved central loan into its partner
//! cluster.
//!
//! Invoked when a loan transitions into APPROVED (and again by the
//! reconciliation sweep for loans whose first attempt failed). The central
//! status change is never rolled back on failure — approval is a business
//! decision independent of partner-system availability, so an APPROVED loan
//! with a NULL `external_loan_id` is a legitimate, detectable state.
//!
//! The partner row carries `external_reference = "LETSEMA-{loan.id}"`;
//! that string is the only cross-system key and is what reconciliation
//! uses for round-trip lookups.

use letsema_ledger::LedgerError;
use letsema_ledger::sqlite::repositories::borrower::BorrowerRepo;
use letsema_ledger::sqlite::repositories::institution::InstitutionRepo;
use letsema_ledger::sqlite::repositories::loan::LoanRepo;
use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::{debug, info};

use crate::cluster::Cluster;
use crate::errors::{PartnerError, Result};
use crate::gateway::{PartnerGateway, value_as_i64};
use crate::identity::{BorrowerIdentity, resolve_or_create_borrower};

/// Prefix of the cross-system reference string.
pub const EXTERNAL_REFERENCE_PREFIX: &str = "LETSEMA-";

/// Build the cross-system reference for a central loan id.
#[must_use]
pub fn external_reference(loan_id: &str) -> String {
    format!("{EXTERNAL_REFERENCE_PREFIX}{loan_id}")
}

/// Mirror an approved central loan into its institution's partner cluster
/// and persist the partner-assigned id back onto the central record.
///
/// Steps, any of which aborts the whole operation:
/// 1. Load the loan and its institution; an empty cluster designator is a
///    configuration error, never retried.
/// 2. Resolve (or create) the partner-side borrower.
/// 3. Insert the partner loan row (`status = "approved"`, application date
///    preserved, approval date = now, external reference set).
/// 4. Write the partner serial id onto `external_loan_id`.
///
/// Returns the partner-assigned loan id.
pub fn federate_approved_loan(
    ledger_conn: &Connection,
    gateway: &PartnerGateway,
    loan_id: &str,
) -> Result<i64> {
    debug!(loan_id, "federating approved loan");

    // 1. Route: loan → institution → cluster
    let loan = LoanRepo::get_by_id(ledger_conn, loan_id)?
        .ok_or_else(|| LedgerError::LoanNotFound(loan_id.to_string()))?;
    let institution = InstitutionRepo::get_by_id(ledger_conn, &loan.institution_id)?
        .ok_or_else(|| LedgerError::InstitutionNotFound(loan.institution_id.clone()))?;
    if institution.cluster_name.is_empty() {
        return Err(PartnerError::Ledger(LedgerError::MissingCluster {
            institution: institution.id,
        }));
    }
    let cluster = Cluster::parse(&institution.cluster_name)
        .ok_or_else(|| PartnerError::UnknownCluster(institution.cluster_name.clone()))?;

    // 2. Identity
    let borrower = BorrowerRepo::get_by_id(ledger_conn, &loan.borrower_id)?
        .ok_or_else(|| LedgerError::BorrowerNotFound(loan.borrower_id.clone()))?;
    let partner_borrower_id = resolve_or_create_borrower(
        gateway,
        cluster,
        &BorrowerIdentity {
            name: &borrower.full_name,
            email: &borrower.email,
            phone: &borrower.phone,
            national_id: &borrower.national_id,
            credit_score: borrower.credit_score,
        },
    )?;

    // 3. Mirror the loan
    let reference = external_reference(&loan.id);
    let now = chrono::Utc::now().to_rfc3339();
    let rows = gateway.execute(
        cluster,
        "INSERT INTO loans (borrower_id, amount, interest_rate, status, purpose,
                            application_date, approval_date, term_months, external_reference)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING id",
        &[
            Value::Integer(partner_borrower_id),
            Value::Real(loan.amount),
            Value::Real(loan.interest_rate),
            Value::Text("approved".to_string()),
            Value::Text(loan.purpose.clone()),
            Value::Text(loan.application_date.clone()),
            Value::Text(now),
            Value::Integer(loan.term_months),
            Value::Text(reference),
        ],
    )?;
    let partner_loan_id = rows
        .first()
        .and_then(|row| row.first())
        .and_then(value_as_i64)
        .ok_or_else(|| PartnerError::UnexpectedRow {
            cluster,
            message: "loan insert returned no id".to_string(),
        })?;

    // 4. Write back
    let _ = LoanRepo::set_external_loan_id(ledger_conn, &loan.id, &partner_loan_id.to_string())?;

    info!(loan_id = %loan.id, %cluster, partner_loan_id, "loan federated into partner cluster");
    Ok(partner_loan_id)
}

/// Round-trip lookup: find the partner loan mirroring a central loan via
/// its `external_reference`. Used by reconciliation to adopt rows written
/// by an earlier attempt whose write-back never landed.
pub fn find_partner_loan_by_reference(
    gateway: &PartnerGateway,
    cluster: Cluster,
    loan_id: &str,
) -> Result<Option<i64>> {
    let rows = gateway.execute(
        cluster,
        "SELECT id FROM loans WHERE external_reference = ?1 LIMIT 1",
        &[Value::Text(external_reference(loan_id))],
    )?;
    Ok(rows.first().and_then(|row| row.first()).and_then(value_as_i64))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::config::PartnerConfig;
    use crate::gateway::{value_as_f64, value_as_text};
    use crate::provision::provision_cluster;
    use assert_matches::assert_matches;
    use letsema_core::LoanStatus;
    use letsema_ledger::sqlite::repositories::borrower::CreateBorrowerOptions;
    use letsema_ledger::sqlite::repositories::institution::CreateInstitutionOptions;
    use letsema_ledger::store::{DecisionOptions, SubmitLoanOptions};
    use letsema_ledger::LedgerStore;

    struct Fixture {
        ledger: LedgerStore,
        gateway: PartnerGateway,
        loan_id: String,
        _dir: tempfile::TempDir,
    }

    fn fixture(cluster_name: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mfi_a.db");
        let config = PartnerConfig::new().with_endpoint(Cluster::MfiA, path.to_str().unwrap());
        provision_cluster(&config, Cluster::MfiA).unwrap();
        let gateway = PartnerGateway::new(config);

        let ledger = LedgerStore::open_in_memory().unwrap();
        let conn = ledger.conn().unwrap();
        let borrower = BorrowerRepo::create(
            &conn,
            &CreateBorrowerOptions {
                full_name: "Thabo Mokoena",
                email: "thabo@x.com",
                phone: "",
                national_id: "N100",
                credit_score: None,
            },
        )
        .unwrap();
        let mfi = InstitutionRepo::create(
            &conn,
            &CreateInstitutionOptions {
                name: "Basotho Finance",
                code: "MFI_A",
                description: "",
                cluster_name: "mfi_a",
                api_endpoint: None,
            },
        )
        .unwrap();
        drop(conn);

        let submitted = ledger
            .submit_loan(&SubmitLoanOptions {
                borrower_id: &borrower.id,
                institution_id: &mfi.id,
                amount: 5000.0,
                purpose: "Seed capital",
                term_months: 12,
                interest_rate: 10.5,
                submitted_by: None,
            })
            .unwrap();
        let decided = ledger
            .apply_decision(&DecisionOptions {
                loan_id: &submitted.loan.id,
                decision: LoanStatus::Approved,
                decided_by: Some("officer_1"),
                notes: "",
            })
            .unwrap();

        if cluster_name != "mfi_a" {
            let conn = ledger.conn().unwrap();
            InstitutionRepo::update_cluster_name(&conn, &mfi.id, cluster_name).unwrap();
        }

        Fixture {
            ledger,
            gateway,
            loan_id: decided.loan.id,
            _dir: dir,
        }
    }

    #[test]
    fn federation_mirrors_loan_and_writes_back_external_id() {
        let fx = fixture("mfi_a");
        let conn = fx.ledger.conn().unwrap();

        let partner_loan_id =
            federate_approved_loan(&conn, &fx.gateway, &fx.loan_id).unwrap();
        assert_eq!(partner_loan_id, 1);

        let loan = LoanRepo::get_by_id(&conn, &fx.loan_id).unwrap().unwrap();
        assert_eq!(loan.external_loan_id.as_deref(), Some("1"));

        let rows = fx
            .gateway
            .execute(
                Cluster::MfiA,
                "SELECT external_reference, status, amount, term_months FROM loans WHERE id = ?1",
                &[Value::Integer(partner_loan_id)],
            )
            .unwrap();
        assert_eq!(
            value_as_text(&rows[0][0]),
            Some(external_reference(&fx.loan_id).as_str())
        );
        assert_eq!(value_as_text(&rows[0][1]), Some("approved"));
        assert_eq!(value_as_f64(&rows[0][2]), Some(5000.0));
        assert_eq!(value_as_i64(&rows[0][3]), Some(12));
    }

    #[test]
    fn federation_creates_partner_borrower_when_absent() {
        let fx = fixture("mfi_a");
        let conn = fx.ledger.conn().unwrap();
        federate_approved_loan(&conn, &fx.gateway, &fx.loan_id).unwrap();

        let rows = fx
            .gateway
            .execute(
                Cluster::MfiA,
                "SELECT national_id, credit_score FROM borrowers",
                &[],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(value_as_text(&rows[0][0]), Some("N100"));
        assert_eq!(value_as_i64(&rows[0][1]), Some(650));
    }

    #[test]
    fn unknown_cluster_name_fails_before_any_write() {
        let fx = fixture("mfi_z");
        let conn = fx.ledger.conn().unwrap();
        let result = federate_approved_loan(&conn, &fx.gateway, &fx.loan_id);
        assert_matches!(result, Err(PartnerError::UnknownCluster(_)));

        let loan = LoanRepo::get_by_id(&conn, &fx.loan_id).unwrap().unwrap();
        assert!(loan.external_loan_id.is_none());
    }

    #[test]
    fn unreachable_cluster_leaves_external_id_null() {
        let fx = fixture("mfi_a");
        let broken = PartnerGateway::new(
            PartnerConfig::new().with_endpoint(Cluster::MfiA, "/nonexistent/dir/a.db"),
        );
        let conn = fx.ledger.conn().unwrap();

        let result = federate_approved_loan(&conn, &broken, &fx.loan_id);
        assert_matches!(result, Err(PartnerError::ConnectionFailed { .. }));

        // Approval stands, federation is recoverable later
        let loan = LoanRepo::get_by_id(&conn, &fx.loan_id).unwrap().unwrap();
        assert_eq!(loan.status, LoanStatus::Approved);
        assert!(loan.external_loan_id.is_none());
        assert_eq!(LoanRepo::list_unfederated(&conn).unwrap().len(), 1);
    }

    #[test]
    fn round_trip_lookup_finds_mirrored_loan() {
        let fx = fixture("mfi_a");
        let conn = fx.ledger.conn().unwrap();
        let partner_loan_id =
            federate_approved_loan(&conn, &fx.gateway, &fx.loan_id).unwrap();

        let found =
            find_partner_loan_by_reference(&fx.gateway, Cluster::MfiA, &fx.loan_id).unwrap();
        assert_eq!(found, Some(partner_loan_id));

        let missing =
            find_partner_loan_by_reference(&fx.gateway, Cluster::MfiA, "loan_other").unwrap();
        assert_eq!(missing, None);
    }
}
