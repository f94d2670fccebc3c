//! # letsema-settings
//!
//! Configuration management with layered sources for the Letsema platform.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`LetsemaSettings::default()`]
//! 2. **User file** — `~/.letsema/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `LETSEMA_*` overrides (highest priority)
//!
//! The cluster connection parameters defined here are the single source of
//! truth for which partner databases exist; the gateway receives them as an
//! immutable value at construction rather than reading ambient state.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<LetsemaSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.letsema/settings.json` with env
/// var overrides. On subsequent calls, returns the cached value. If loading
/// fails, returns compiled defaults.
pub fn get_settings() -> &'static LetsemaSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already initialized.
pub fn init_settings(settings: LetsemaSettings) -> std::result::Result<(), LetsemaSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
