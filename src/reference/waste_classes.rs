//! One-to-one map from classifier output ids to waste labels.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Classifier output id.
pub type WasteClassId = u32;

/// A waste class row as stored in reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WasteClass {
    pub class_id: WasteClassId,
    pub waste_label: String,
}

#[derive(Debug, Clone, Default)]
pub struct WasteClassMap {
    by_id: BTreeMap<WasteClassId, String>,
}

impl WasteClassMap {
    /// Build from rows. Both ids and labels must be unique.
    pub fn from_rows(rows: Vec<WasteClass>) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut by_id = BTreeMap::new();
        let mut labels = HashSet::new();

        for row in rows {
            if !labels.insert(row.waste_label.clone()) {
                errors.push(format!(
                    "waste label '{}' is mapped by more than one class",
                    row.waste_label
                ));
            }
            if by_id.insert(row.class_id, row.waste_label).is_some() {
                errors.push(format!("duplicate waste class id {}", row.class_id));
            }
        }

        if errors.is_empty() {
            Ok(Self { by_id })
        } else {
            Err(errors)
        }
    }

    pub fn resolve(&self, class_id: WasteClassId) -> Option<&str> {
        self.by_id.get(&class_id).map(String::as_str)
    }

    /// Classes in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (WasteClassId, &str)> {
        self.by_id.iter().map(|(id, label)| (*id, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
