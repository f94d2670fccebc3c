//! Immutable partner connection configuration.
//!
//! The gateway receives this as a value at construction — cluster
//! connection parameters are never read from ambient global state.

use std::collections::HashMap;

use letsema_settings::ClusterSettings;

use crate::cluster::Cluster;

/// Connection parameters for every configured partner cluster.
#[derive(Clone, Debug, Default)]
pub struct PartnerConfig {
    endpoints: HashMap<Cluster, String>,
}

impl PartnerConfig {
    /// Empty configuration — every cluster is unconfigured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the database path for a cluster.
    #[must_use]
    pub fn with_endpoint(mut self, cluster: Cluster, db_path: impl Into<String>) -> Self {
        let _ = self.endpoints.insert(cluster, db_path.into());
        self
    }

    /// Build from the platform settings.
    #[must_use]
    pub fn from_settings(settings: &ClusterSettings) -> Self {
        Self::new()
            .with_endpoint(Cluster::MfiA, settings.mfi_a.db_path.clone())
            .with_endpoint(Cluster::MfiB, settings.mfi_b.db_path.clone())
    }

    /// The database path for a cluster, if configured.
    #[must_use]
    pub fn db_path(&self, cluster: Cluster) -> Option<&str> {
        self.endpoints.get(&cluster).map(String::as_str)
    }

    /// Clusters that have connection parameters.
    pub fn configured(&self) -> impl Iterator<Item = Cluster> + '_ {
        Cluster::ALL
            .into_iter()
            .filter(|c| self.endpoints.contains_key(c))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
