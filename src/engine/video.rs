//! Recipe video search link for a recommendation.

use crate::config::defaults::{GENERAL_FERTILITY, VIDEO_SEARCH_BASE_URL};
use crate::types::Nutrient;

/// Search link for an organic fertilizer recipe using `waste_label` to fix
/// the given deficiencies. No deficiencies means general fertility.
pub fn recipe_video_link(waste_label: &str, deficiencies: &[Nutrient]) -> String {
    let target = if deficiencies.is_empty() {
        GENERAL_FERTILITY.to_string()
    } else {
        deficiencies
            .iter()
            .map(|n| n.symbol())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let query = format!("Organic fertilizer recipe {waste_label} to fix {target}");
    let query = query.split_whitespace().collect::<Vec<_>>().join("+");
    format!("{VIDEO_SEARCH_BASE_URL}{query}")
}
