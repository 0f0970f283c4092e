//! Soil deficiency evaluation against a crop's nutrient targets.

use crate::config::defaults::DEFICIENCY_THRESHOLD;
use crate::types::{CropTarget, Nutrient, SoilProfile};

/// Flags nutrients whose soil level is below `threshold` times the target.
#[derive(Debug, Clone, Copy)]
pub struct DeficiencyEvaluator {
    threshold: f64,
}

impl DeficiencyEvaluator {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Deficient nutrients in N, P, K order.
    ///
    /// Strict comparison: a soil value exactly at `target * threshold` is
    /// sufficient. An empty result means the general-fertility path.
    pub fn evaluate(&self, soil: &SoilProfile, target: &CropTarget) -> Vec<Nutrient> {
        Nutrient::ALL
            .into_iter()
            .filter(|&n| soil.value(n) < target.value(n) * self.threshold)
            .collect()
    }
}

impl Default for DeficiencyEvaluator {
    fn default() -> Self {
        Self::new(DEFICIENCY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rice() -> CropTarget {
        CropTarget::new("rice", 90.0, 45.0, 45.0)
    }

    #[test]
    fn test_only_nitrogen_below_sixty_percent() {
        // N: 20 < 54; P: 50 >= 27; K: 30 >= 27
        let soil = SoilProfile::new(20.0, 50.0, 30.0);
        let deficits = DeficiencyEvaluator::default().evaluate(&soil, &rice());
        assert_eq!(deficits, vec![Nutrient::Nitrogen]);
    }

    #[test]
    fn test_boundary_is_not_deficient() {
        let target = rice();
        let soil = SoilProfile::new(
            target.n * 0.6,
            target.p * 0.6,
            target.k * 0.6,
        );
        assert!(DeficiencyEvaluator::default().evaluate(&soil, &target).is_empty());
    }

    #[test]
    fn test_just_below_boundary_is_deficient() {
        let target = rice();
        let soil = SoilProfile::new(53.99, 26.99, 26.99);
        assert_eq!(
            DeficiencyEvaluator::default().evaluate(&soil, &target),
            vec![Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium]
        );
    }

    #[test]
    fn test_order_is_n_p_k() {
        let soil = SoilProfile::new(0.0, 100.0, 0.0);
        let deficits = DeficiencyEvaluator::default().evaluate(&soil, &rice());
        assert_eq!(deficits, vec![Nutrient::Nitrogen, Nutrient::Potassium]);
    }

    #[test]
    fn test_zero_target_never_deficient() {
        let target = CropTarget::new("fallow", 0.0, 0.0, 0.0);
        let soil = SoilProfile::new(0.0, 0.0, 0.0);
        assert!(DeficiencyEvaluator::default().evaluate(&soil, &target).is_empty());
    }

    #[test]
    fn test_custom_threshold() {
        let soil = SoilProfile::new(80.0, 45.0, 45.0);
        let strict = DeficiencyEvaluator::new(0.9);
        assert_eq!(strict.evaluate(&soil, &rice()), vec![Nutrient::Nitrogen]);
    }
}
