//! Settings type definitions.
//!
//! All types use serde defaults so a partial settings file deep-merges
//! cleanly over compiled defaults.

use serde::{Deserialize, Serialize};

fn default_data_dir() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/.letsema")
}

/// Root settings for the Letsema platform.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LetsemaSettings {
    /// Settings schema version.
    pub version: String,
    /// Platform name.
    pub name: String,
    /// Central ledger database settings.
    pub ledger: LedgerSettings,
    /// Credit-history document cache settings.
    pub cache: CacheSettings,
    /// Partner cluster connection parameters.
    pub clusters: ClusterSettings,
}

impl Default for LetsemaSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "letsema".to_string(),
            ledger: LedgerSettings::default(),
            cache: CacheSettings::default(),
            clusters: ClusterSettings::default(),
        }
    }
}

/// Central ledger database settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    /// Path to the ledger database file.
    pub db_path: String,
    /// Maximum connection pool size.
    pub pool_size: u32,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Page cache size in KiB.
    pub cache_size_kib: i64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            db_path: format!("{}/ledger.db", default_data_dir()),
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
        }
    }
}

/// Credit-history document cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Path to the document-store database file.
    pub db_path: String,
    /// Maximum connection pool size.
    pub pool_size: u32,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            db_path: format!("{}/credit_cache.db", default_data_dir()),
            pool_size: 8,
        }
    }
}

/// Connection parameters for the closed set of partner clusters.
///
/// Adding a partner means adding a field here (and a `Cluster` variant in
/// `letsema-partners`) — the set is deliberately closed, not discovered.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterSettings {
    /// Partner cluster `mfi_a`.
    pub mfi_a: ClusterEndpoint,
    /// Partner cluster `mfi_b`.
    pub mfi_b: ClusterEndpoint,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            mfi_a: ClusterEndpoint {
                db_path: format!("{}/mfi_a.db", default_data_dir()),
            },
            mfi_b: ClusterEndpoint {
                db_path: format!("{}/mfi_b.db", default_data_dir()),
            },
        }
    }
}

/// Connection parameters for a single partner cluster.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterEndpoint {
    /// Path to the partner's database.
    pub db_path: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
