//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse: the raw TOML is first walked as a `toml::Value` tree and
//! compared against the known key set, emitting "did you mean?" warnings.
//! Serde deserialization runs afterwards. Warnings never break a config.

use std::collections::HashSet;

use super::MarketConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of [`MarketConfig`].
///
/// Keep in sync with `market_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [matching]
        "matching",
        "matching.deficiency_threshold",
        "matching.max_search_radius_km",
        "matching.max_results",
        // [timeouts]
        "timeouts",
        "timeouts.classifier_ms",
        "timeouts.detector_ms",
        "timeouts.persistence_ms",
        // [storage]
        "storage",
        "storage.backend",
        "storage.data_dir",
        // [server]
        "server",
        "server.addr",
        // [models]
        "models",
        "models.classifier_url",
        "models.detector_url",
        // [reference]
        "reference",
        "reference.path",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively collect all dotted key paths of a TOML table.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// Closest known key within edit distance 3. Ties resolve alphabetically.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= 3)
        .min()
        .map(|(_, k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every key in `raw_toml` that the config does not know.
///
/// Parse errors return no warnings; serde reports them afterwards.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Check value ranges on a parsed config.
///
/// Returns (errors, warnings): errors are values that would break matching
/// or block forever; warnings are legal but unusual.
pub fn validate_ranges(config: &MarketConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let m = &config.matching;
    if !(m.deficiency_threshold > 0.0 && m.deficiency_threshold <= 1.0) {
        errors.push(format!(
            "matching.deficiency_threshold = {} must be in (0, 1]",
            m.deficiency_threshold
        ));
    }
    if !(m.max_search_radius_km.is_finite() && m.max_search_radius_km > 0.0) {
        errors.push(format!(
            "matching.max_search_radius_km = {} must be a positive distance",
            m.max_search_radius_km
        ));
    } else if m.max_search_radius_km > 500.0 {
        warnings.push(ValidationWarning {
            field: "matching.max_search_radius_km".to_string(),
            message: format!(
                "max_search_radius_km = {:.0} is unusually large for local waste pickup",
                m.max_search_radius_km
            ),
            suggestion: None,
        });
    }
    if m.max_results == 0 {
        errors.push("matching.max_results must be > 0".to_string());
    }

    let t = &config.timeouts;
    for (name, ms) in [
        ("timeouts.classifier_ms", t.classifier_ms),
        ("timeouts.detector_ms", t.detector_ms),
        ("timeouts.persistence_ms", t.persistence_ms),
    ] {
        if ms == 0 {
            errors.push(format!("{name} must be > 0"));
        }
    }

    if config.server.addr.trim().is_empty() {
        errors.push("server.addr must not be empty".to_string());
    }

    for (name, url) in [
        ("models.classifier_url", &config.models.classifier_url),
        ("models.detector_url", &config.models.detector_url),
    ] {
        if let Some(url) = url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                errors.push(format!("{name} = '{url}' must be an http(s) URL"));
            }
        }
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
