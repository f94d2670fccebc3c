//! High-level `LedgerStore` API.
//!
//! The [`LedgerStore`] provides a transactional, loan-centric API built on
//! top of the repository layer. All multi-step writes are atomic — a loan
//! and its audit row commit together or not at all.

mod ledger_store;

pub use ledger_store::*;
