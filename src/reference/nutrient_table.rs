//! Nutrient concentration lookup per waste label.

use std::collections::HashMap;

use crate::types::NutrientConcentration;

/// Static table of nutrient concentration per waste label.
///
/// Labels match the detector vocabulary exactly (case-sensitive) and are
/// unique.
#[derive(Debug, Clone, Default)]
pub struct NutrientTable {
    rows: Vec<NutrientConcentration>,
    index: HashMap<String, usize>,
}

impl NutrientTable {
    /// Build from rows, rejecting duplicate labels and negative values.
    pub fn from_rows(rows: Vec<NutrientConcentration>) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut index = HashMap::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            if row.waste_label.trim().is_empty() {
                errors.push(format!("nutrients[{i}] has an empty waste_label"));
            }
            let v = row.as_vector();
            if !v.is_finite() || v.n < 0.0 || v.p < 0.0 || v.k < 0.0 {
                errors.push(format!(
                    "nutrients '{}' has a negative or non-finite concentration",
                    row.waste_label
                ));
            }
            if index.insert(row.waste_label.clone(), i).is_some() {
                errors.push(format!("duplicate nutrient row for '{}'", row.waste_label));
            }
        }

        if errors.is_empty() {
            Ok(Self { rows, index })
        } else {
            Err(errors)
        }
    }

    pub fn get(&self, waste_label: &str) -> Option<&NutrientConcentration> {
        self.index.get(waste_label).map(|&i| &self.rows[i])
    }

    pub fn contains(&self, waste_label: &str) -> bool {
        self.index.contains_key(waste_label)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
