//! Exchange Configuration Module
//!
//! Matching limits, model endpoints, timeouts and storage settings loaded
//! from TOML.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line
//! 2. `EXCHANGE_CONFIG` environment variable (path to TOML file)
//! 3. `exchange_config.toml` in the current working directory
//! 4. Built-in defaults
//!
//! ## Usage
//!
//! ```ignore
//! // In main():
//! config::init(MarketConfig::load(None));
//!
//! // Elsewhere:
//! let radius = config::get().matching.max_search_radius_km;
//! ```

mod market_config;
pub mod defaults;
pub mod validation;

pub use market_config::*;

use std::sync::OnceLock;

/// Global configuration, installed once at startup.
static MARKET_CONFIG: OnceLock<MarketConfig> = OnceLock::new();

/// Install the global configuration.
///
/// A second call is ignored with a warning.
pub fn init(config: MarketConfig) {
    if MARKET_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global configuration.
///
/// Falls back to built-in defaults if `init()` was never called.
pub fn get() -> &'static MarketConfig {
    MARKET_CONFIG.get_or_init(|| {
        tracing::warn!("config::get() called before config::init(), using defaults");
        MarketConfig::default()
    })
}
