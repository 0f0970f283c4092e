//! Nutrient types: Nutrient, NpkVector, SoilProfile, CropTarget, NutrientConcentration

use serde::{Deserialize, Serialize};

// ============================================================================
// Nutrient
// ============================================================================

/// One of the three macronutrients tracked by the exchange.
///
/// Ordering follows the conventional N, P, K listing, which is also the
/// order deficiencies are reported in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Nutrient {
    #[serde(rename = "N")]
    Nitrogen,
    #[serde(rename = "P")]
    Phosphorus,
    #[serde(rename = "K")]
    Potassium,
}

impl Nutrient {
    /// All nutrients in reporting order.
    pub const ALL: [Self; 3] = [Self::Nitrogen, Self::Phosphorus, Self::Potassium];

    /// Single-letter chemical symbol.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Nitrogen => "N",
            Self::Phosphorus => "P",
            Self::Potassium => "K",
        }
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// NPK Vector
// ============================================================================

/// An `{N, P, K}` triple used for targets, concentrations and scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct NpkVector {
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl NpkVector {
    pub const fn new(n: f64, p: f64, k: f64) -> Self {
        Self { n, p, k }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub const fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.n,
            Nutrient::Phosphorus => self.p,
            Nutrient::Potassium => self.k,
        }
    }

    /// Every component multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.n * factor, self.p * factor, self.k * factor)
    }

    /// Accumulate `other * weight` into `self`.
    pub fn add_scaled(&mut self, other: &Self, weight: f64) {
        self.n += other.n * weight;
        self.p += other.p * weight;
        self.k += other.k * weight;
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.n * other.n + self.p * other.p + self.k * other.k
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.n.is_finite() && self.p.is_finite() && self.k.is_finite()
    }
}

// ============================================================================
// Farmer & Crop Inputs
// ============================================================================

/// Soil test values supplied by the farmer for one request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SoilProfile {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl SoilProfile {
    pub const fn new(nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            nitrogen,
            phosphorus,
            potassium,
        }
    }

    pub const fn value(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
        }
    }

    /// Soil readings must be finite and non-negative.
    pub fn is_valid(&self) -> bool {
        Nutrient::ALL
            .iter()
            .all(|n| self.value(*n).is_finite() && self.value(*n) >= 0.0)
    }
}

/// Reference nutrient requirement for a crop.
///
/// Labels are stored lower-cased; lookups are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CropTarget {
    pub label: String,
    #[serde(rename = "N")]
    pub n: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
}

impl CropTarget {
    pub fn new(label: &str, n: f64, p: f64, k: f64) -> Self {
        Self {
            label: label.to_lowercase(),
            n,
            p,
            k,
        }
    }

    pub const fn as_vector(&self) -> NpkVector {
        NpkVector::new(self.n, self.p, self.k)
    }

    pub const fn value(&self, nutrient: Nutrient) -> f64 {
        self.as_vector().get(nutrient)
    }
}

/// Nutrient content per unit mass of a waste category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutrientConcentration {
    pub waste_label: String,
    pub nitrogen_per_unit: f64,
    pub phosphorus_per_unit: f64,
    pub potassium_per_unit: f64,
}

impl NutrientConcentration {
    pub fn new(waste_label: &str, n: f64, p: f64, k: f64) -> Self {
        Self {
            waste_label: waste_label.to_string(),
            nitrogen_per_unit: n,
            phosphorus_per_unit: p,
            potassium_per_unit: k,
        }
    }

    pub const fn as_vector(&self) -> NpkVector {
        NpkVector::new(
            self.nitrogen_per_unit,
            self.phosphorus_per_unit,
            self.potassium_per_unit,
        )
    }
}
