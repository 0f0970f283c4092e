//! Nutrient scoring for listed waste.
//!
//! `score_single` is linear in quantity: `concentration * quantity`.
//! `score_weighted` combines detector output into one weighted profile and
//! picks the dominant label. A batch with nothing recognizable is a soft
//! failure (`status = Failed`) so callers can fall back to manual input.

use std::collections::HashMap;
use tracing::debug;

use crate::error::{MarketError, MarketResult};
use crate::reference::NutrientTable;
use crate::types::{DetectedItem, NpkVector, ScoreStatus, WeightedScore};

#[derive(Debug, Clone, Copy)]
pub struct NutrientScorer<'a> {
    table: &'a NutrientTable,
}

impl<'a> NutrientScorer<'a> {
    pub const fn new(table: &'a NutrientTable) -> Self {
        Self { table }
    }

    /// Nutrient content of `quantity` units of `waste_label`.
    pub fn score_single(&self, waste_label: &str, quantity: f64) -> MarketResult<NpkVector> {
        let row = self.table.get(waste_label).ok_or_else(|| {
            MarketError::NotFound(format!("no nutrient data for waste '{waste_label}'"))
        })?;
        let score = row.as_vector().scaled(quantity);
        if !score.is_finite() {
            return Err(MarketError::Validation(format!(
                "score of {quantity} units of '{waste_label}' is out of range"
            )));
        }
        Ok(score)
    }

    /// Weighted profile of a detection batch.
    ///
    /// Items with an unknown label or a non-positive weight are skipped.
    /// `total_weight` sums only the contributing items. The dominant label
    /// has the largest summed weight; ties go to the label seen first.
    pub fn score_weighted(&self, items: &[DetectedItem]) -> WeightedScore {
        let mut combined = NpkVector::zero();
        let mut total_weight = 0.0;
        // (label, summed weight) in first-seen order
        let mut per_label: Vec<(&str, f64)> = Vec::new();
        let mut slot: HashMap<&str, usize> = HashMap::new();

        for item in items {
            let weight = item.quantity_weight;
            if !(weight.is_finite() && weight > 0.0) {
                continue;
            }
            let Some(row) = self.table.get(&item.label) else {
                debug!(label = %item.label, weight, "Skipping detection with no nutrient data");
                continue;
            };

            combined.add_scaled(&row.as_vector(), weight);
            total_weight += weight;

            let idx = *slot.entry(item.label.as_str()).or_insert_with(|| {
                per_label.push((item.label.as_str(), 0.0));
                per_label.len() - 1
            });
            per_label[idx].1 += weight;
        }

        if total_weight <= 0.0 {
            return WeightedScore::failed();
        }

        let mut dominant: Option<(&str, f64)> = None;
        for &(label, weight) in &per_label {
            if dominant.map_or(true, |(_, best)| weight > best) {
                dominant = Some((label, weight));
            }
        }

        WeightedScore {
            status: ScoreStatus::Success,
            dominant_label: dominant.map(|(label, _)| label.to_string()),
            combined_score: combined,
            total_weight,
        }
    }
}
