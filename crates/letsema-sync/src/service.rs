//! Loan-lifecycle orchestration.
//!
//! [`LifecycleService`] is what the external handlers call: submission,
//! decisions, lifecycle transitions, payment events, and credit-history
//! reads. It wires the three subsystems together with the platform's
//! partial-failure rules:
//!
//! - A decision commits to the ledger first. Federation into the partner
//!   cluster runs after, and its failure is logged and re-raised without
//!   reverting the status — an APPROVED loan with no `external_loan_id` is
//!   recoverable by the reconciliation sweep.
//! - Every ledger write that touches a borrower's standing fires the
//!   write-triggered cache refresh. Refresh failures are logged and never
//!   fail the triggering write.

use letsema_core::LoanStatus;
use letsema_credit::{CreditCacheStore, CreditHistory};
use letsema_ledger::sqlite::ConnectionConfig;
use letsema_ledger::sqlite::repositories::borrower::BorrowerRepo;
use letsema_ledger::sqlite::repositories::loan::LoanRepo;
use letsema_ledger::store::{
    DecisionOptions, DecisionResult, LedgerStore, SubmitLoanOptions, SubmitLoanResult,
};
use letsema_ledger::{LedgerError, StatusUpdateRow};
use letsema_partners::{PartnerConfig, PartnerGateway, federate_approved_loan};
use letsema_settings::LetsemaSettings;
use tracing::{error, info};

use crate::errors::Result;

/// Orchestrates the loan lifecycle across ledger, partners, and cache.
pub struct LifecycleService {
    ledger: LedgerStore,
    gateway: PartnerGateway,
    cache: CreditCacheStore,
}

impl LifecycleService {
    /// Assemble the service from its three subsystems.
    #[must_use]
    pub fn new(ledger: LedgerStore, gateway: PartnerGateway, cache: CreditCacheStore) -> Self {
        Self {
            ledger,
            gateway,
            cache,
        }
    }

    /// Assemble the service from platform settings: file-backed ledger and
    /// cache, gateway over the configured cluster endpoints.
    pub fn from_settings(settings: &LetsemaSettings) -> Result<Self> {
        let ledger = LedgerStore::open_file(
            &settings.ledger.db_path,
            &ConnectionConfig {
                pool_size: settings.ledger.pool_size,
                busy_timeout_ms: settings.ledger.busy_timeout_ms,
                cache_size_kib: settings.ledger.cache_size_kib,
            },
        )?;
        let gateway = PartnerGateway::new(PartnerConfig::from_settings(&settings.clusters));
        let cache = CreditCacheStore::open_file(&settings.cache.db_path, settings.cache.pool_size)?;
        Ok(Self::new(ledger, gateway, cache))
    }

    /// The underlying ledger store.
    #[must_use]
    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// The partner gateway.
    #[must_use]
    pub fn gateway(&self) -> &PartnerGateway {
        &self.gateway
    }

    /// The credit cache.
    #[must_use]
    pub fn cache(&self) -> &CreditCacheStore {
        &self.cache
    }

    // ─────────────────────────────────────────────────────────────────────
    // Write paths
    // ─────────────────────────────────────────────────────────────────────

    /// Submit a new application. The initial audit row counts as a
    /// status-update event, so the cache refresh fires.
    pub fn submit_application(&self, opts: &SubmitLoanOptions<'_>) -> Result<SubmitLoanResult> {
        let result = self.ledger.submit_loan(opts)?;
        self.refresh_after_event(&result.loan.borrower_id);
        Ok(result)
    }

    /// Decide a pending application (APPROVED or REJECTED).
    ///
    /// On approval, federation runs after the decision commits. A
    /// federation failure is logged and re-raised — the caller sees the
    /// error, the approval stands, and the loan joins the reconciliation
    /// work list.
    pub fn decide_loan(&self, opts: &DecisionOptions<'_>) -> Result<DecisionResult> {
        let decided = self.ledger.apply_decision(opts)?;
        self.refresh_after_event(&decided.loan.borrower_id);

        if decided.loan.status == LoanStatus::Approved {
            // Scope the connection to the federation call: the refresh below
            // needs the pool slot back.
            let federation = {
                let conn = self.ledger.conn()?;
                federate_approved_loan(&conn, &self.gateway, &decided.loan.id)
            };
            match federation {
                Ok(partner_loan_id) => {
                    info!(loan_id = %decided.loan.id, partner_loan_id, "approved loan federated");
                    // external_loan_id changed — refresh again
                    self.refresh_after_event(&decided.loan.borrower_id);
                }
                Err(err) => {
                    error!(loan_id = %decided.loan.id, %err,
                           "federation failed after approval; loan left for reconciliation");
                    return Err(err.into());
                }
            }
        }

        Ok(decided)
    }

    /// Record a later lifecycle transition (DISBURSED, REPAID, DEFAULTED…).
    pub fn record_status_transition(
        &self,
        loan_id: &str,
        new_status: LoanStatus,
        actor: Option<&str>,
        notes: &str,
    ) -> Result<DecisionResult> {
        let result = self
            .ledger
            .record_status_transition(loan_id, new_status, actor, notes)?;
        self.refresh_after_event(&result.loan.borrower_id);
        Ok(result)
    }

    /// Record a payment event (received or late).
    pub fn record_payment_event(
        &self,
        loan_id: &str,
        sentinel: &str,
        actor: Option<&str>,
        notes: &str,
    ) -> Result<StatusUpdateRow> {
        let row = self
            .ledger
            .record_payment_event(loan_id, sentinel, actor, notes)?;
        let loan = {
            let conn = self.ledger.conn()?;
            LoanRepo::get_by_id(&conn, loan_id)?
                .ok_or_else(|| LedgerError::LoanNotFound(loan_id.to_string()))?
        };
        self.refresh_after_event(&loan.borrower_id);
        Ok(row)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Read path
    // ─────────────────────────────────────────────────────────────────────

    /// Serve a borrower's credit history: cached document, or a full
    /// merged rebuild on miss.
    pub fn credit_history(&self, national_id: &str) -> Result<CreditHistory> {
        let conn = self.ledger.conn()?;
        Ok(self.cache.get_or_build(national_id, &conn, &self.gateway)?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────

    /// Fire the write-triggered cache refresh for a borrower. Failures are
    /// logged with full context and never propagate to the caller — the
    /// ledger write they follow has already committed.
    fn refresh_after_event(&self, borrower_id: &str) {
        let refresh = || -> Result<()> {
            let conn = self.ledger.conn()?;
            let borrower = BorrowerRepo::get_by_id(&conn, borrower_id)?
                .ok_or_else(|| LedgerError::BorrowerNotFound(borrower_id.to_string()))?;
            self.cache.refresh_central(&conn, &borrower.national_id)?;
            Ok(())
        };
        if let Err(err) = refresh() {
            error!(borrower_id, %err, "failed to refresh credit history after ledger event");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
