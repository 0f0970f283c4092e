//! Reference data: nutrient concentrations, crop targets, waste classes and
//! producers.
//!
//! Loaded once at startup from the TOML file named by `[reference] path`, or
//! from the built-in tables. Read-only afterwards; the offer ledger is the
//! only mutable state in the service.

mod builtin;
mod crop_table;
mod nutrient_table;
mod producers;
mod waste_classes;

pub use crop_table::CropTable;
pub use nutrient_table::NutrientTable;
pub use producers::ProducerDirectory;
pub use waste_classes::{WasteClass, WasteClassId, WasteClassMap};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::{CropTarget, NutrientConcentration, Producer};

/// Reference data as written in TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReferenceData {
    #[serde(default)]
    pub nutrients: Vec<NutrientConcentration>,
    #[serde(default)]
    pub crops: Vec<CropTarget>,
    #[serde(default)]
    pub waste_classes: Vec<WasteClass>,
    #[serde(default)]
    pub producers: Vec<Producer>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("cannot read reference data {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("cannot parse reference data {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
    #[error("invalid reference data: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Validated, indexed reference tables.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub nutrients: NutrientTable,
    pub crops: CropTable,
    pub waste_classes: WasteClassMap,
    pub producers: ProducerDirectory,
}

impl ReferenceData {
    /// Built-in tables.
    pub fn builtin() -> Result<Self, ReferenceError> {
        Self::from_raw(builtin::reference_data())
    }

    /// Load from `path`, or the built-in tables when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ReferenceError> {
        let Some(path) = path else {
            return Self::builtin();
        };

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ReferenceError::Io(path.to_path_buf(), e))?;
        let raw: RawReferenceData = toml::from_str(&contents)
            .map_err(|e| ReferenceError::Parse(path.to_path_buf(), e))?;
        let data = Self::from_raw(raw)?;

        tracing::info!(
            path = %path.display(),
            nutrients = data.nutrients.len(),
            crops = data.crops.len(),
            classes = data.waste_classes.len(),
            producers = data.producers.len(),
            "Reference data loaded"
        );
        Ok(data)
    }

    /// Index and cross-check raw tables.
    ///
    /// Every waste class must resolve to a nutrient row, otherwise a
    /// recommendation could name a waste with no known concentration.
    pub fn from_raw(raw: RawReferenceData) -> Result<Self, ReferenceError> {
        let mut errors = Vec::new();

        let nutrients = NutrientTable::from_rows(raw.nutrients).unwrap_or_else(|e| {
            errors.extend(e);
            NutrientTable::default()
        });
        let crops = CropTable::from_rows(raw.crops).unwrap_or_else(|e| {
            errors.extend(e);
            CropTable::default()
        });
        let waste_classes = WasteClassMap::from_rows(raw.waste_classes).unwrap_or_else(|e| {
            errors.extend(e);
            WasteClassMap::default()
        });
        let producers = ProducerDirectory::from_rows(raw.producers).unwrap_or_else(|e| {
            errors.extend(e);
            ProducerDirectory::default()
        });

        if !nutrients.is_empty() {
            for (id, label) in waste_classes.iter() {
                if !nutrients.contains(label) {
                    errors.push(format!(
                        "waste class {id} maps to '{label}', which has no nutrient row"
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(Self {
                nutrients,
                crops,
                waste_classes,
                producers,
            })
        } else {
            Err(ReferenceError::Invalid(errors))
        }
    }
}
