//! System-wide default constants.
//!
//! Grouped by subsystem. Every value here can be overridden from
//! `exchange_config.toml` unless noted otherwise.

// ============================================================================
// Matching
// ============================================================================

/// A nutrient is deficient when the soil holds less than this fraction of
/// the crop's target.
pub const DEFICIENCY_THRESHOLD: f64 = 0.6;

/// Offers farther than this from the farmer are never ranked (km).
pub const MAX_SEARCH_RADIUS_KM: f64 = 50.0;

/// Maximum number of ranked offers returned per recommendation.
pub const MAX_RANKED_OFFERS: usize = 5;

/// Mean Earth radius used for great-circle distances (km, IUGG value).
///
/// Not configurable.
pub const EARTH_MEAN_RADIUS_KM: f64 = 6_371.008_8;

// ============================================================================
// External Calls
// ============================================================================

/// Upper bound on a single classifier prediction (ms).
pub const CLASSIFIER_TIMEOUT_MS: u64 = 2_000;

/// Upper bound on a single vision detection (ms). Remote vision models are slow.
pub const DETECTOR_TIMEOUT_MS: u64 = 20_000;

/// Upper bound on one durable flush of the offer collection (ms).
pub const PERSISTENCE_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Recommendation Output
// ============================================================================

/// Base URL for instructional video searches.
pub const VIDEO_SEARCH_BASE_URL: &str = "https://www.youtube.com/results?search_query=";

/// Phrase used in place of a deficiency list when the soil meets all targets.
pub const GENERAL_FERTILITY: &str = "general fertility";

// ============================================================================
// Server & Storage
// ============================================================================

/// Default HTTP bind address.
pub const SERVER_ADDR: &str = "0.0.0.0:8000";

/// Default data directory for the offer store.
pub const DATA_DIR: &str = "./data";

/// Largest accepted photo upload (bytes). 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
