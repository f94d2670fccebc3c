//! Branded ID newtypes for type safety.
//!
//! Every central-ledger entity has a distinct ID type implemented as a
//! newtype wrapper around `String`. This prevents accidentally passing a
//! borrower ID where a loan ID is expected.
//!
//! All IDs are UUID v7 (time-ordered) with a short entity prefix, generated
//! via [`uuid::Uuid::now_v7`]. Partner-side rows keep their own integer
//! serial keys and are never wrapped in these types.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (prefixed UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::now_v7()))
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

branded_id!(
    /// Central borrower profile ID (`bor_…`).
    BorrowerId,
    "bor"
);

branded_id!(
    /// Microfinance institution ID (`mfi_…`).
    InstitutionId,
    "mfi"
);

branded_id!(
    /// Central loan application ID (`loan_…`).
    LoanId,
    "loan"
);

branded_id!(
    /// Loan status update (audit row) ID (`lsu_…`).
    StatusUpdateId,
    "lsu"
);

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
