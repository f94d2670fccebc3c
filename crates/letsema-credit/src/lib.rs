//! # letsema-credit
//!
//! Credit-history aggregation and caching for the Letsema platform.
//!
//! - **[`history`]**: the credit-history document types (bounded score,
//!   payment-history entries with heterogeneous loan references, inquiries)
//! - **[`aggregate`]**: projections from the central ledger and from each
//!   partner cluster, plus the order-sensitive merge
//! - **[`cache`]**: the document store serving cached aggregates, with full
//!   rebuild on miss and central-only patch on write-triggered refresh
//! - **[`sample`]**: fixture documents for development

#![deny(unsafe_code)]

pub mod aggregate;
pub mod cache;
pub mod errors;
pub mod history;
pub mod sample;

pub use aggregate::{
    central_credit_view, central_score, merge_credit_views, merged_credit_view,
    partner_credit_view, partner_score,
};
pub use cache::{CachePool, CreditCacheStore};
pub use errors::{CreditError, Result};
pub use history::{
    CreditHistory, InquiryEntry, LoanRef, MAX_SCORE, MIN_SCORE, PaymentHistoryEntry, clamp_score,
};
pub use sample::sample_history;
