//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`LetsemaSettings::default()`]
//! 2. If `~/.letsema/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `LETSEMA_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::LetsemaSettings;

/// Resolve the path to the settings file (`~/.letsema/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".letsema").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<LetsemaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<LetsemaSettings> {
    let defaults = serde_json::to_value(LetsemaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: LetsemaSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Integers must parse and fall within range; invalid values are silently
/// ignored (falling back to file/default).
pub fn apply_env_overrides(settings: &mut LetsemaSettings) {
    // ── Ledger ──────────────────────────────────────────────────────
    if let Some(v) = read_env_string("LETSEMA_LEDGER_DB") {
        settings.ledger.db_path = v;
    }
    if let Some(v) = read_env_u32("LETSEMA_LEDGER_POOL_SIZE", 1, 128) {
        settings.ledger.pool_size = v;
    }
    if let Some(v) = read_env_u32("LETSEMA_LEDGER_BUSY_TIMEOUT_MS", 100, 600_000) {
        settings.ledger.busy_timeout_ms = v;
    }

    // ── Credit cache ────────────────────────────────────────────────
    if let Some(v) = read_env_string("LETSEMA_CACHE_DB") {
        settings.cache.db_path = v;
    }
    if let Some(v) = read_env_u32("LETSEMA_CACHE_POOL_SIZE", 1, 128) {
        settings.cache.pool_size = v;
    }

    // ── Partner clusters ────────────────────────────────────────────
    if let Some(v) = read_env_string("LETSEMA_MFI_A_DB") {
        settings.clusters.mfi_a.db_path = v;
    }
    if let Some(v) = read_env_string("LETSEMA_MFI_B_DB") {
        settings.clusters.mfi_b.db_path = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

fn read_env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn read_env_u32(key: &str, min: u32, max: u32) -> Option<u32> {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_u32_range(&v, min, max))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
