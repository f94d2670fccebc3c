//! The closed set of partner clusters.
//!
//! Each cluster is an independently operated MFI database reachable only
//! through the gateway. Adding a partner means adding a variant here plus
//! its connection parameters in `letsema-settings` — the set is enumerated,
//! never discovered at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A partner cluster identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cluster {
    /// Partner cluster `mfi_a`.
    MfiA,
    /// Partner cluster `mfi_b`.
    MfiB,
}

impl Cluster {
    /// All clusters, in the fixed iteration order used by credit-view
    /// merging. Changing this order changes merged scores.
    pub const ALL: [Self; 2] = [Self::MfiA, Self::MfiB];

    /// The cluster designator as stored on institutions.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MfiA => "mfi_a",
            Self::MfiB => "mfi_b",
        }
    }

    /// Parse a cluster designator. Returns `None` for unknown names.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mfi_a" => Some(Self::MfiA),
            "mfi_b" => Some(Self::MfiB),
            _ => None,
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
