//! Sample credit-history documents for development fixtures.
//!
//! Produces a plausible document for a national id without touching any
//! backend. Used to seed demo environments and cache round-trip tests.

use chrono::{Duration, Utc};
use rand::Rng;

use crate::history::{CreditHistory, InquiryEntry, LoanRef, PaymentHistoryEntry, clamp_score};

/// Generate a sample document with randomized but in-range values.
#[must_use]
pub fn sample_history(national_id: &str) -> CreditHistory {
    let mut rng = rand::rng();
    let now = Utc::now();

    let payment_history = (1..=12)
        .map(|i| {
            let date = (now - Duration::days(i * 30)).to_rfc3339();
            PaymentHistoryEntry {
                loan_id: LoanRef::Partner(i),
                amount: f64::from(rng.random_range(100..=1000)),
                status: if i % 4 == 0 { "late" } else { "paid" }.to_string(),
                application_date: Some(date.clone()),
                approval_date: Some(date),
                repayments_count: rng.random_range(0..=12),
                late_payments: rng.random_range(0..=3),
            }
        })
        .collect();

    let inquiries = (1..=5)
        .map(|i| InquiryEntry {
            date: (now - Duration::days(i * 90)).to_rfc3339(),
            inquirer: format!("Bank_{i}"),
            purpose: if i % 2 == 0 { "credit" } else { "loan" }.to_string(),
        })
        .collect();

    CreditHistory {
        national_id: national_id.to_string(),
        credit_score: clamp_score(rng.random_range(300..=850)),
        active_loans: rng.random_range(0..=5),
        total_debt: f64::from(rng.random_range(0..=50_000)),
        payment_history,
        inquiries,
        created_at: now.to_rfc3339(),
        updated_at: now.to_rfc3339(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
