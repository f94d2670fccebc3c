//! Reconciliation sweep for unfederated approvals.
//!
//! Federation is at-least-once: an approval whose partner write failed (or
//! whose write-back never landed) leaves an APPROVED loan with a NULL
//! `external_loan_id`. The sweep walks that work list and converges each
//! loan:
//!
//! 1. Round-trip lookup by `external_reference = "LETSEMA-{id}"` — if the
//!    partner row already exists, adopt its id instead of inserting a
//!    duplicate.
//! 2. Otherwise re-attempt federation.
//!
//! Per-loan failures are logged and counted; the sweep continues.

use letsema_ledger::LedgerStore;
use letsema_ledger::sqlite::repositories::institution::InstitutionRepo;
use letsema_ledger::sqlite::repositories::loan::LoanRepo;
use letsema_partners::{
    Cluster, PartnerGateway, federate_approved_loan, find_partner_loan_by_reference,
};
use tracing::{info, warn};

use crate::errors::Result;

/// Outcome counts of a reconciliation sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Loans examined (APPROVED with NULL `external_loan_id`).
    pub examined: usize,
    /// Loans whose partner row already existed; the id was adopted.
    pub adopted: usize,
    /// Loans federated by this sweep.
    pub federated: usize,
    /// Loans that still failed; left for the next sweep.
    pub failed: usize,
}

/// Walk all unfederated approvals and try to converge each one.
pub fn reconcile_unfederated(
    ledger: &LedgerStore,
    gateway: &PartnerGateway,
) -> Result<ReconcileSummary> {
    let work_list = {
        let conn = ledger.conn()?;
        LoanRepo::list_unfederated(&conn)?
    };

    let mut summary = ReconcileSummary {
        examined: work_list.len(),
        ..ReconcileSummary::default()
    };

    for loan in work_list {
        let outcome = reconcile_one(ledger, gateway, &loan.id);
        match outcome {
            Ok(true) => summary.adopted += 1,
            Ok(false) => summary.federated += 1,
            Err(err) => {
                warn!(loan_id = %loan.id, %err, "reconciliation failed for loan");
                summary.failed += 1;
            }
        }
    }

    info!(
        examined = summary.examined,
        adopted = summary.adopted,
        federated = summary.federated,
        failed = summary.failed,
        "reconciliation sweep complete"
    );
    Ok(summary)
}

/// Converge one loan. Returns `true` if an existing partner row was
/// adopted, `false` if the loan was federated fresh.
fn reconcile_one(ledger: &LedgerStore, gateway: &PartnerGateway, loan_id: &str) -> Result<bool> {
    let conn = ledger.conn()?;
    let loan = LoanRepo::get_by_id(&conn, loan_id)?
        .ok_or_else(|| letsema_ledger::LedgerError::LoanNotFound(loan_id.to_string()))?;
    let institution = InstitutionRepo::get_by_id(&conn, &loan.institution_id)?.ok_or_else(|| {
        letsema_ledger::LedgerError::InstitutionNotFound(loan.institution_id.clone())
    })?;
    let cluster = Cluster::parse(&institution.cluster_name).ok_or_else(|| {
        letsema_partners::PartnerError::UnknownCluster(institution.cluster_name.clone())
    })?;

    if let Some(partner_loan_id) = find_partner_loan_by_reference(gateway, cluster, &loan.id)? {
        let _ = LoanRepo::set_external_loan_id(&conn, &loan.id, &partner_loan_id.to_string())?;
        info!(loan_id = %loan.id, %cluster, partner_loan_id,
              "adopted existing partner loan during reconciliation");
        return Ok(true);
    }

    let _ = federate_approved_loan(&conn, gateway, &loan.id)?;
    Ok(false)
}
