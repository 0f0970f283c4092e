//! Detection types: DetectedItem, ScoreStatus, WeightedScore

use serde::{Deserialize, Serialize};

use super::NpkVector;

/// One item reported by the vision detector.
///
/// `quantity_weight` is a dimensionless proxy (bounding-box area or a 1-10
/// relative score). Items with zero weight contribute nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedItem {
    pub label: String,
    pub quantity_weight: f64,
}

impl DetectedItem {
    pub fn new(label: &str, quantity_weight: f64) -> Self {
        Self {
            label: label.to_string(),
            quantity_weight,
        }
    }
}

/// Outcome of a weighted multi-item score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStatus {
    Success,
    Failed,
}

/// Combined nutrient score for a batch of detected items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedScore {
    pub status: ScoreStatus,
    pub dominant_label: Option<String>,
    pub combined_score: NpkVector,
    pub total_weight: f64,
}

impl WeightedScore {
    pub const fn failed() -> Self {
        Self {
            status: ScoreStatus::Failed,
            dominant_label: None,
            combined_score: NpkVector::zero(),
            total_weight: 0.0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ScoreStatus::Success
    }
}
