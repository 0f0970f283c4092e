//! Producer directory: seller display data and pickup coordinates.

use std::collections::HashMap;

use crate::types::Producer;

#[derive(Debug, Clone, Default)]
pub struct ProducerDirectory {
    producers: HashMap<String, Producer>,
}

impl ProducerDirectory {
    pub fn from_rows(rows: Vec<Producer>) -> Result<Self, Vec<String>> {
        let mut errors = Vec::new();
        let mut producers = HashMap::with_capacity(rows.len());

        for row in rows {
            if !row.location().is_valid() {
                errors.push(format!(
                    "producer '{}' has invalid coordinates ({}, {})",
                    row.producer_id, row.latitude, row.longitude
                ));
            }
            let id = row.producer_id.clone();
            if producers.insert(id.clone(), row).is_some() {
                errors.push(format!("duplicate producer id '{id}'"));
            }
        }

        if errors.is_empty() {
            Ok(Self { producers })
        } else {
            Err(errors)
        }
    }

    pub fn get(&self, producer_id: &str) -> Option<&Producer> {
        self.producers.get(producer_id)
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}
