//! Crop nutrient targets keyed by lower-cased crop label.

use std::collections::BTreeMap;

use crate::types::CropTarget;

#[derive(Debug, Clone, Default)]
pub struct CropTable {
    targets: BTreeMap<String, CropTarget>,
}

impl CropTable {
    /// Build from rows. Labels are lower-cased; duplicates and negative
    /// targets are rejected.
    pub fn from_rows(rows: Vec<CropTarget>) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut targets = BTreeMap::new();

        for row in rows {
            let row = CropTarget::new(&row.label, row.n, row.p, row.k);
            let v = row.as_vector();
            if !v.is_finite() || v.n < 0.0 || v.p < 0.0 || v.k < 0.0 {
                errors.push(format!("crop '{}' has a negative or non-finite target", row.label));
            }
            if targets.contains_key(&row.label) {
                errors.push(format!("duplicate crop target for '{}'", row.label));
                continue;
            }
            targets.insert(row.label.clone(), row);
        }

        if errors.is_empty() {
            Ok(Self { targets })
        } else {
            Err(errors)
        }
    }

    /// Case-insensitive exact match on the crop label.
    pub fn lookup(&self, crop_label: &str) -> Option<&CropTarget> {
        self.targets.get(&crop_label.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        let table = CropTable::from_rows(vec![CropTarget::new("rice", 90.0, 45.0, 45.0)]).unwrap();
        assert!(table.lookup("RICE").is_some());
        assert!(table.lookup(" Rice ").is_some());
        assert!(table.lookup("ric").is_none());
    }

    #[test]
    fn test_duplicate_after_lowercasing_rejected() {
        let result = CropTable::from_rows(vec![
            CropTarget::new("Maize", 78.0, 48.0, 20.0),
            CropTarget::new("maize", 80.0, 40.0, 20.0),
        ]);
        assert!(result.is_err());
    }
}
