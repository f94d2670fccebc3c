//! # letsema-partners
//!
//! Partner cluster access for the Letsema lending platform.
//!
//! Each microfinance institution operates its own database ("cluster"),
//! reachable only through the [`gateway::PartnerGateway`]. On top of the
//! gateway sit:
//!
//! - **[`identity`]**: borrower identity resolution across systems with no
//!   shared primary keys (email / national-id match, create on miss)
//! - **[`federation`]**: mirroring approved central loans into the owning
//!   partner's schema, keyed by the `"LETSEMA-{loan id}"` reference
//! - **[`provision`]**: bootstrap of the fixed partner schema contract for
//!   locally hosted clusters and tests
//!
//! The cluster set is closed ([`cluster::Cluster`]); connection parameters
//! arrive as an immutable [`config::PartnerConfig`] at construction.

#![deny(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod errors;
pub mod federation;
pub mod gateway;
pub mod identity;
pub mod provision;

pub use cluster::Cluster;
pub use config::PartnerConfig;
pub use errors::{PartnerError, Result};
pub use federation::{
    EXTERNAL_REFERENCE_PREFIX, external_reference, federate_approved_loan,
    find_partner_loan_by_reference,
};
pub use gateway::{PartnerGateway, PartnerRow, value_as_f64, value_as_i64, value_as_text};
pub use identity::{
    BorrowerIdentity, DEFAULT_PARTNER_CREDIT_SCORE, find_borrower, resolve_or_create_borrower,
};
pub use provision::provision_cluster;
