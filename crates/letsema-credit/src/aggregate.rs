//! Credit aggregation engine.
//!
//! Builds credit-history projections from the central ledger and from each
//! partner cluster, then merges them into a single document.
//!
//! The two sources use deliberately different scoring formulas — a central
//! score and a partner score are not comparable before the merge:
//!
//! - **Central**: base 600, +30 per APPROVED application, −50 per REJECTED,
//!   −20 per late-payment event, clamped to the valid range.
//! - **Partner**: 750 − 20 × Σ late repayments across the partner's loans,
//!   clamped.
//!
//! The merge is a left fold in fixed cluster order that averages scores
//! pairwise (integer floor). It is neither associative nor commutative —
//! merge order changes the final score. That is intended behavior, covered
//! by a dedicated test.

use letsema_core::{LoanStatus, PAYMENT_LATE, PAYMENT_RECEIVED};
use letsema_ledger::sqlite::repositories::borrower::BorrowerRepo;
use letsema_ledger::sqlite::repositories::loan::LoanRepo;
use letsema_ledger::sqlite::repositories::status_update::StatusUpdateRepo;
use letsema_partners::{
    Cluster, PartnerError, PartnerGateway, value_as_f64, value_as_i64, value_as_text,
};
use rusqlite::Connection;
use rusqlite::types::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::history::{CreditHistory, LoanRef, PaymentHistoryEntry, clamp_score};

const CENTRAL_BASE_SCORE: i64 = 600;
const CENTRAL_APPROVED_BONUS: i64 = 30;
const CENTRAL_REJECTED_PENALTY: i64 = 50;
const CENTRAL_LATE_PENALTY: i64 = 20;

const PARTNER_BASE_SCORE: i64 = 750;
const PARTNER_LATE_PENALTY: i64 = 20;

/// Central score formula: base 600, +30 per APPROVED, −50 per REJECTED,
/// −20 per late payment, clamped.
#[must_use]
pub fn central_score(approved: i64, rejected: i64, late: i64) -> i64 {
    clamp_score(
        CENTRAL_BASE_SCORE + CENTRAL_APPROVED_BONUS * approved
            - CENTRAL_REJECTED_PENALTY * rejected
            - CENTRAL_LATE_PENALTY * late,
    )
}

/// Partner score formula: 750 − 20 per late repayment, clamped.
#[must_use]
pub fn partner_score(total_late: i64) -> i64 {
    clamp_score(PARTNER_BASE_SCORE - PARTNER_LATE_PENALTY * total_late)
}

/// Compute the central-ledger credit view for a borrower.
///
/// Returns `None` when no central borrower carries the national id. One
/// payment-history entry is produced per loan application, with repayment
/// and late counts derived from that loan's audit trail. The central view
/// never carries inquiries.
pub fn central_credit_view(
    conn: &Connection,
    national_id: &str,
) -> Result<Option<CreditHistory>> {
    let Some(borrower) = BorrowerRepo::get_by_national_id(conn, national_id)? else {
        debug!(national_id, "no central borrower for national id");
        return Ok(None);
    };

    let loans = LoanRepo::list_by_borrower(conn, &borrower.id)?;

    let mut payment_history = Vec::with_capacity(loans.len());
    let mut active_loans = 0;
    let mut total_debt = 0.0;
    let mut approved = 0;
    let mut rejected = 0;
    let mut total_late = 0;

    for loan in &loans {
        match loan.status {
            LoanStatus::Approved => {
                approved += 1;
                active_loans += 1;
                total_debt += loan.amount;
            }
            LoanStatus::Rejected => rejected += 1,
            _ => {}
        }

        let repayments =
            StatusUpdateRepo::count_with_status(conn, &loan.id, PAYMENT_RECEIVED)?;
        let late = StatusUpdateRepo::count_with_status(conn, &loan.id, PAYMENT_LATE)?;
        total_late += late;

        payment_history.push(PaymentHistoryEntry {
            loan_id: LoanRef::Central(loan.id.clone()),
            amount: loan.amount,
            status: loan.status.as_str().to_string(),
            application_date: Some(loan.application_date.clone()),
            approval_date: loan.decision_date.clone(),
            repayments_count: repayments,
            late_payments: late,
        });
    }

    let now = chrono::Utc::now().to_rfc3339();
    Ok(Some(CreditHistory {
        national_id: national_id.to_string(),
        credit_score: central_score(approved, rejected, total_late),
        active_loans,
        total_debt,
        payment_history,
        inquiries: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    }))
}

/// Compute a partner cluster's credit view for a borrower.
///
/// Loans are joined to repayments and grouped per loan; loans whose status
/// literal is `"active"` accumulate into the active count and debt total.
/// Partner systems do not track inquiries.
pub fn partner_credit_view(
    gateway: &PartnerGateway,
    cluster: Cluster,
    national_id: &str,
) -> Result<CreditHistory> {
    let rows = gateway.execute(
        cluster,
        "SELECT l.id, l.amount, l.status, l.application_date, l.approval_date,
                COUNT(r.id) AS repayments_count,
                SUM(CASE WHEN r.status = 'late' THEN 1 ELSE 0 END) AS late_count
         FROM loans l
         LEFT JOIN repayments r ON l.id = r.loan_id
         WHERE l.borrower_id IN (
             SELECT id FROM borrowers WHERE national_id = ?1
         )
         GROUP BY l.id",
        &[Value::Text(national_id.to_string())],
    )?;

    let mut payment_history = Vec::with_capacity(rows.len());
    let mut active_loans = 0;
    let mut total_debt = 0.0;
    let mut total_late = 0;

    for row in &rows {
        let loan_id = value_as_i64(&row[0]).ok_or_else(|| unexpected(cluster, "loan id"))?;
        let amount = value_as_f64(&row[1]).ok_or_else(|| unexpected(cluster, "amount"))?;
        let status = value_as_text(&row[2])
            .ok_or_else(|| unexpected(cluster, "status"))?
            .to_string();
        let application_date = value_as_text(&row[3]).map(ToString::to_string);
        let approval_date = value_as_text(&row[4]).map(ToString::to_string);
        let repayments_count = value_as_i64(&row[5]).unwrap_or(0);
        let late_payments = value_as_i64(&row[6]).unwrap_or(0);

        if status == "active" {
            active_loans += 1;
            total_debt += amount;
        }
        total_late += late_payments;

        payment_history.push(PaymentHistoryEntry {
            loan_id: LoanRef::Partner(loan_id),
            amount,
            status,
            application_date,
            approval_date,
            repayments_count,
            late_payments,
        });
    }

    let now = chrono::Utc::now().to_rfc3339();
    Ok(CreditHistory {
        national_id: national_id.to_string(),
        credit_score: partner_score(total_late),
        active_loans,
        total_debt,
        payment_history,
        inquiries: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Merge partner views into a base (central) view.
///
/// Order-sensitive: payment histories concatenate in the order given,
/// counts and debt add, and the score is replaced at each step by the
/// integer floor of the average of the accumulator and the addition.
#[must_use]
pub fn merge_credit_views(
    mut base: CreditHistory,
    additions: Vec<CreditHistory>,
) -> CreditHistory {
    for addition in additions {
        base.payment_history.extend(addition.payment_history);
        base.active_loans += addition.active_loans;
        base.total_debt += addition.total_debt;
        base.credit_score = (base.credit_score + addition.credit_score) / 2;
    }
    base
}

/// Compute the fully merged credit view: central plus every cluster in
/// fixed order. A partner view that fails to compute is logged and skipped
/// — the merge degrades to fewer sources rather than failing the read.
pub fn merged_credit_view(
    conn: &Connection,
    gateway: &PartnerGateway,
    national_id: &str,
) -> Result<Option<CreditHistory>> {
    let Some(central) = central_credit_view(conn, national_id)? else {
        return Ok(None);
    };

    let mut additions = Vec::with_capacity(Cluster::ALL.len());
    for cluster in Cluster::ALL {
        match partner_credit_view(gateway, cluster, national_id) {
            Ok(view) => additions.push(view),
            Err(err) => {
                warn!(%cluster, national_id, %err, "skipping partner credit view");
            }
        }
    }

    Ok(Some(merge_credit_views(central, additions)))
}

fn unexpected(cluster: Cluster, what: &str) -> PartnerError {
    PartnerError::UnexpectedRow {
        cluster,
        message: format!("{what} has unexpected type"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::history::{MAX_SCORE, MIN_SCORE};
    use letsema_ledger::LedgerStore;
    use letsema_ledger::sqlite::repositories::borrower::CreateBorrowerOptions;
    use letsema_ledger::sqlite::repositories::institution::{
        CreateInstitutionOptions, InstitutionRepo,
    };
    use letsema_ledger::store::{DecisionOptions, SubmitLoanOptions};
    use letsema_partners::{PartnerConfig, provision_cluster};
    use proptest::prelude::*;

    fn ledger_with_borrower(national_id: &str) -> (LedgerStore, String, String) {
        let store = LedgerStore::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        let borrower = BorrowerRepo::create(
            &conn,
            &CreateBorrowerOptions {
                full_name: "Thabo Mokoena",
                email: "thabo@x.com",
                phone: "",
                national_id,
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
        (store, borrower.id, mfi.id)
    }

    fn submit_and_decide(
        store: &LedgerStore,
        borrower_id: &str,
        mfi_id: &str,
        amount: f64,
        decision: Option<LoanStatus>,
    ) -> String {
        let submitted = store
            .submit_loan(&SubmitLoanOptions {
                borrower_id,
                institution_id: mfi_id,
                amount,
                purpose: "",
                term_months: 12,
                interest_rate: 10.5,
                submitted_by: None,
            })
            .unwrap();
        if let Some(decision) = decision {
            store
                .apply_decision(&DecisionOptions {
                    loan_id: &submitted.loan.id,
                    decision,
                    decided_by: None,
                    notes: "",
                })
                .unwrap();
        }
        submitted.loan.id
    }

    #[test]
    fn central_view_none_for_unknown_borrower() {
        let (store, _, _) = ledger_with_borrower("N100");
        let conn = store.conn().unwrap();
        assert!(central_credit_view(&conn, "UNKNOWN").unwrap().is_none());
    }

    #[test]
    fn central_view_base_score_with_no_loans() {
        let (store, _, _) = ledger_with_borrower("N100");
        let conn = store.conn().unwrap();
        let view = central_credit_view(&conn, "N100").unwrap().unwrap();
        assert_eq!(view.credit_score, 600);
        assert_eq!(view.active_loans, 0);
        assert_eq!(view.total_debt, 0.0);
        assert!(view.payment_history.is_empty());
        assert!(view.inquiries.is_empty());
    }

    #[test]
    fn central_view_scores_one_approved_loan() {
        let (store, borrower_id, mfi_id) = ledger_with_borrower("TEST123");
        submit_and_decide(&store, &borrower_id, &mfi_id, 5000.0, Some(LoanStatus::Approved));

        let conn = store.conn().unwrap();
        let view = central_credit_view(&conn, "TEST123").unwrap().unwrap();
        assert_eq!(view.credit_score, 630);
        assert_eq!(view.active_loans, 1);
        assert_eq!(view.total_debt, 5000.0);
        assert_eq!(view.payment_history.len(), 1);
        assert!(view.payment_history[0].loan_id.is_central());
        assert_eq!(view.payment_history[0].status, "APPROVED");
        assert!(view.payment_history[0].approval_date.is_some());
    }

    #[test]
    fn central_view_counts_late_payments_across_loans() {
        let (store, borrower_id, mfi_id) = ledger_with_borrower("N100");
        let loan_a =
            submit_and_decide(&store, &borrower_id, &mfi_id, 5000.0, Some(LoanStatus::Approved));
        let loan_b =
            submit_and_decide(&store, &borrower_id, &mfi_id, 2000.0, Some(LoanStatus::Approved));

        store
            .record_payment_event(&loan_a, PAYMENT_LATE, None, "")
            .unwrap();
        store
            .record_payment_event(&loan_b, PAYMENT_LATE, None, "")
            .unwrap();
        store
            .record_payment_event(&loan_b, PAYMENT_RECEIVED, None, "")
            .unwrap();

        let conn = store.conn().unwrap();
        let view = central_credit_view(&conn, "N100").unwrap().unwrap();
        // 600 + 2×30 − 2×20
        assert_eq!(view.credit_score, 620);
        let entry_b = view
            .payment_history
            .iter()
            .find(|e| e.loan_id == LoanRef::Central(loan_b.clone()))
            .unwrap();
        assert_eq!(entry_b.repayments_count, 1);
        assert_eq!(entry_b.late_payments, 1);
    }

    #[test]
    fn central_view_terminal_loans_are_not_active() {
        let (store, borrower_id, mfi_id) = ledger_with_borrower("N100");
        let loan =
            submit_and_decide(&store, &borrower_id, &mfi_id, 5000.0, Some(LoanStatus::Approved));
        store
            .record_status_transition(&loan, LoanStatus::Repaid, None, "")
            .unwrap();

        let conn = store.conn().unwrap();
        let view = central_credit_view(&conn, "N100").unwrap().unwrap();
        assert_eq!(view.active_loans, 0);
        assert_eq!(view.total_debt, 0.0);
        assert_eq!(view.payment_history[0].status, "REPAID");
    }

    #[test]
    fn central_score_clamps_at_extremes() {
        // 0 approved + 50 rejected would be 600 − 2500
        assert_eq!(central_score(0, 50, 0), MIN_SCORE);
        // 10 approved, nothing else: 600 + 300 = 900 → clamped
        assert_eq!(central_score(10, 0, 0), MAX_SCORE);
    }

    proptest! {
        #[test]
        fn central_score_always_in_range(
            approved in 0i64..500,
            rejected in 0i64..500,
            late in 0i64..500,
        ) {
            let score = central_score(approved, rejected, late);
            prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
        }

        #[test]
        fn partner_score_always_in_range(late in 0i64..500) {
            let score = partner_score(late);
            prop_assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
        }
    }

    fn partner_fixture() -> (PartnerGateway, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = PartnerConfig::new()
            .with_endpoint(Cluster::MfiA, dir.path().join("a.db").to_str().unwrap())
            .with_endpoint(Cluster::MfiB, dir.path().join("b.db").to_str().unwrap());
        provision_cluster(&config, Cluster::MfiA).unwrap();
        provision_cluster(&config, Cluster::MfiB).unwrap();
        (PartnerGateway::new(config), dir)
    }

    fn seed_partner_loan(
        gateway: &PartnerGateway,
        cluster: Cluster,
        national_id: &str,
        amount: f64,
        status: &str,
        late_repayments: i64,
    ) {
        let rows = gateway
            .execute(
                cluster,
                "INSERT INTO borrowers (name, email, phone, national_id, credit_score, created_at, updated_at)
                 VALUES ('T', ?1, '', ?2, 650, '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')
                 RETURNING id",
                &[
                    Value::Text(format!("{national_id}@x.com")),
                    Value::Text(national_id.to_string()),
                ],
            )
            .unwrap();
        let borrower_id = value_as_i64(&rows[0][0]).unwrap();

        let rows = gateway
            .execute(
                cluster,
                "INSERT INTO loans (borrower_id, amount, interest_rate, status, purpose,
                                    application_date, approval_date, term_months, external_reference)
                 VALUES (?1, ?2, 10.0, ?3, '', '2025-01-01T00:00:00Z', NULL, 12, NULL)
                 RETURNING id",
                &[
                    Value::Integer(borrower_id),
                    Value::Real(amount),
                    Value::Text(status.to_string()),
                ],
            )
            .unwrap();
        let loan_id = value_as_i64(&rows[0][0]).unwrap();

        for _ in 0..late_repayments {
            gateway
                .execute(
                    cluster,
                    "INSERT INTO repayments (loan_id, amount, status, payment_date)
                     VALUES (?1, 100.0, 'late', '2025-02-01T00:00:00Z')",
                    &[Value::Integer(loan_id)],
                )
                .unwrap();
        }
    }

    #[test]
    fn partner_view_empty_cluster_scores_base() {
        let (gateway, _dir) = partner_fixture();
        let view = partner_credit_view(&gateway, Cluster::MfiA, "N100").unwrap();
        assert_eq!(view.credit_score, 750);
        assert_eq!(view.active_loans, 0);
        assert!(view.payment_history.is_empty());
    }

    #[test]
    fn partner_view_accumulates_active_loans_and_late_penalties() {
        let (gateway, _dir) = partner_fixture();
        seed_partner_loan(&gateway, Cluster::MfiA, "N100", 3000.0, "active", 2);

        let view = partner_credit_view(&gateway, Cluster::MfiA, "N100").unwrap();
        // 750 − 2×20
        assert_eq!(view.credit_score, 710);
        assert_eq!(view.active_loans, 1);
        assert_eq!(view.total_debt, 3000.0);
        assert_eq!(view.payment_history.len(), 1);
        assert_eq!(view.payment_history[0].loan_id, LoanRef::Partner(1));
        assert_eq!(view.payment_history[0].late_payments, 2);
        assert_eq!(view.payment_history[0].repayments_count, 2);
    }

    #[test]
    fn partner_view_closed_loans_do_not_accumulate() {
        let (gateway, _dir) = partner_fixture();
        seed_partner_loan(&gateway, Cluster::MfiA, "N100", 3000.0, "closed", 0);

        let view = partner_credit_view(&gateway, Cluster::MfiA, "N100").unwrap();
        assert_eq!(view.active_loans, 0);
        assert_eq!(view.total_debt, 0.0);
        assert_eq!(view.payment_history.len(), 1);
    }

    fn synthetic_view(score: i64) -> CreditHistory {
        CreditHistory {
            national_id: "N100".into(),
            credit_score: score,
            active_loans: 1,
            total_debt: 100.0,
            payment_history: vec![],
            inquiries: vec![],
            created_at: "2025-01-01T00:00:00Z".into(),
            updated_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn merge_averages_scores_with_integer_floor() {
        let merged = merge_credit_views(synthetic_view(700), vec![synthetic_view(501)]);
        // floor((700 + 501) / 2)
        assert_eq!(merged.credit_score, 600);
        assert_eq!(merged.active_loans, 2);
        assert_eq!(merged.total_debt, 200.0);
    }

    #[test]
    fn merge_order_changes_final_score() {
        let a = synthetic_view(500);
        let b = synthetic_view(800);

        let ab = merge_credit_views(synthetic_view(700), vec![a.clone(), b.clone()]);
        let ba = merge_credit_views(synthetic_view(700), vec![b, a]);

        // [A, B]: (700+500)/2 = 600, then (600+800)/2 = 700
        assert_eq!(ab.credit_score, 700);
        // [B, A]: (700+800)/2 = 750, then (750+500)/2 = 625
        assert_eq!(ba.credit_score, 625);
        assert_ne!(ab.credit_score, ba.credit_score);
    }

    #[test]
    fn merged_view_concatenates_central_then_partners() {
        let (store, borrower_id, mfi_id) = ledger_with_borrower("N100");
        submit_and_decide(&store, &borrower_id, &mfi_id, 5000.0, Some(LoanStatus::Approved));

        let (gateway, _dir) = partner_fixture();
        seed_partner_loan(&gateway, Cluster::MfiA, "N100", 3000.0, "active", 0);
        seed_partner_loan(&gateway, Cluster::MfiB, "N100", 800.0, "active", 1);

        let conn = store.conn().unwrap();
        let merged = merged_credit_view(&conn, &gateway, "N100").unwrap().unwrap();

        // central 630, mfi_a 750, mfi_b 730: (630+750)/2 = 690, (690+730)/2 = 710
        assert_eq!(merged.credit_score, 710);
        assert_eq!(merged.active_loans, 3);
        assert_eq!(merged.total_debt, 5000.0 + 3000.0 + 800.0);
        assert_eq!(merged.payment_history.len(), 3);
        assert!(merged.payment_history[0].loan_id.is_central());
        assert_eq!(merged.payment_history[1].loan_id, LoanRef::Partner(1));
        assert_eq!(merged.payment_history[2].loan_id, LoanRef::Partner(1));
    }

    #[test]
    fn merged_view_skips_unreachable_partner() {
        let (store, borrower_id, mfi_id) = ledger_with_borrower("N100");
        submit_and_decide(&store, &borrower_id, &mfi_id, 5000.0, Some(LoanStatus::Approved));

        // Only mfi_a is configured; mfi_b fails and is skipped
        let dir = tempfile::tempdir().unwrap();
        let config = PartnerConfig::new()
            .with_endpoint(Cluster::MfiA, dir.path().join("a.db").to_str().unwrap());
        provision_cluster(&config, Cluster::MfiA).unwrap();
        let gateway = PartnerGateway::new(config);

        let conn = store.conn().unwrap();
        let merged = merged_credit_view(&conn, &gateway, "N100").unwrap().unwrap();
        // central 630 merged with mfi_a's empty 750 only
        assert_eq!(merged.credit_score, 690);
    }

    #[test]
    fn merged_view_none_without_central_borrower() {
        let (store, _, _) = ledger_with_borrower("N100");
        let (gateway, _dir) = partner_fixture();
        let conn = store.conn().unwrap();
        assert!(
            merged_credit_view(&conn, &gateway, "UNKNOWN")
                .unwrap()
                .is_none()
        );
    }
}
