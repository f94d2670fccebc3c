//! Bulk backfill sweeps.
//!
//! Two operational commands that walk every central borrower:
//!
//! - [`sync_borrowers`] pre-creates partner-side borrower rows in a cluster
//!   so first-time approvals do not pay the identity-creation write.
//! - [`backfill_credit_histories`] rebuilds the central contribution of
//!   every cached credit document.
//!
//! Both log and count per-borrower failures and keep going.

use letsema_credit::CreditCacheStore;
use letsema_ledger::LedgerStore;
use letsema_ledger::sqlite::repositories::borrower::BorrowerRepo;
use letsema_partners::{BorrowerIdentity, Cluster, PartnerGateway, resolve_or_create_borrower};
use tracing::{info, warn};

use crate::errors::Result;

/// Outcome counts of a backfill sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    /// Borrowers processed successfully.
    pub synced: usize,
    /// Borrowers that failed; logged and skipped.
    pub failed: usize,
}

/// Resolve every central borrower into a partner cluster, creating
/// partner-side rows where absent.
pub fn sync_borrowers(
    ledger: &LedgerStore,
    gateway: &PartnerGateway,
    cluster: Cluster,
) -> Result<BackfillSummary> {
    let conn = ledger.conn()?;
    let borrowers = BorrowerRepo::list(&conn)?;

    let mut summary = BackfillSummary::default();
    for borrower in borrowers {
        let identity = BorrowerIdentity {
            name: &borrower.full_name,
            email: &borrower.email,
            phone: &borrower.phone,
            national_id: &borrower.national_id,
            credit_score: borrower.credit_score,
        };
        match resolve_or_create_borrower(gateway, cluster, &identity) {
            Ok(_) => summary.synced += 1,
            Err(err) => {
                warn!(%cluster, national_id = %borrower.national_id, %err,
                      "failed to sync borrower into partner cluster");
                summary.failed += 1;
            }
        }
    }

    info!(%cluster, synced = summary.synced, failed = summary.failed, "borrower sync complete");
    Ok(summary)
}

/// Rebuild the central-only cached document for every central borrower.
pub fn backfill_credit_histories(
    ledger: &LedgerStore,
    cache: &CreditCacheStore,
) -> Result<BackfillSummary> {
    let conn = ledger.conn()?;
    let borrowers = BorrowerRepo::list(&conn)?;

    let mut summary = BackfillSummary::default();
    for borrower in borrowers {
        match cache.refresh_central(&conn, &borrower.national_id) {
            Ok(()) => summary.synced += 1,
            Err(err) => {
                warn!(national_id = %borrower.national_id, %err,
                      "failed to backfill credit history");
                summary.failed += 1;
            }
        }
    }

    info!(synced = summary.synced, failed = summary.failed, "credit history backfill complete");
    Ok(summary)
}
