//! Farmer-side flow: soil test in, recommended waste and ranked sellers out.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Marketplace;
use crate::engine::recipe_video_link;
use crate::error::{MarketError, MarketResult};
use crate::reference::WasteClassId;
use crate::types::{GeoPoint, Nutrient, NutrientConcentration, RankedOffer, SoilProfile};

/// A farmer's recommendation request. Missing fields take demo defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmerRequest {
    #[serde(default = "default_crop_type")]
    pub crop_type: String,
    #[serde(default = "default_soil_nitrogen")]
    pub soil_nitrogen: f64,
    #[serde(default = "default_soil_phosphorus")]
    pub soil_phosphorus: f64,
    #[serde(default = "default_soil_potassium")]
    pub soil_potassium: f64,
    #[serde(default = "default_farmer_lat")]
    pub farmer_lat: f64,
    #[serde(default = "default_farmer_lon")]
    pub farmer_lon: f64,
}

fn default_crop_type() -> String {
    "rice".to_string()
}
fn default_soil_nitrogen() -> f64 {
    40.0
}
fn default_soil_phosphorus() -> f64 {
    50.0
}
fn default_soil_potassium() -> f64 {
    30.0
}
fn default_farmer_lat() -> f64 {
    28.6
}
fn default_farmer_lon() -> f64 {
    77.2
}

impl Default for FarmerRequest {
    fn default() -> Self {
        Self {
            crop_type: default_crop_type(),
            soil_nitrogen: default_soil_nitrogen(),
            soil_phosphorus: default_soil_phosphorus(),
            soil_potassium: default_soil_potassium(),
            farmer_lat: default_farmer_lat(),
            farmer_lon: default_farmer_lon(),
        }
    }
}

impl FarmerRequest {
    pub const fn soil(&self) -> SoilProfile {
        SoilProfile::new(self.soil_nitrogen, self.soil_phosphorus, self.soil_potassium)
    }

    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.farmer_lat, self.farmer_lon)
    }
}

/// Recommendation returned to the farmer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub crop_target: String,
    pub soil_status: String,
    pub deficiencies: Vec<Nutrient>,
    pub predicted_class: WasteClassId,
    pub recommended_waste: String,
    pub recommended_nutrients: NutrientConcentration,
    pub video_recommendation_link: String,
    pub location_message: String,
    pub nearest_suppliers: Vec<RankedOffer>,
}

fn soil_status(deficiencies: &[Nutrient]) -> String {
    if deficiencies.is_empty() {
        "Soil meets crop targets; general fertility boost suggested.".to_string()
    } else {
        let list = deficiencies
            .iter()
            .map(|n| n.symbol())
            .collect::<Vec<_>>()
            .join(", ");
        format!("Soil needs boost in: {list}")
    }
}

impl Marketplace {
    /// Evaluate the soil, pick a waste through the classifier and rank the
    /// cheapest nearby offers of that waste.
    pub async fn recommend(&self, request: &FarmerRequest) -> MarketResult<Recommendation> {
        let soil = request.soil();
        if !soil.is_valid() {
            return Err(MarketError::Validation(
                "soil values must be finite and non-negative".to_string(),
            ));
        }
        let farmer = request.location();
        if !farmer.is_valid() {
            return Err(MarketError::Validation(format!(
                "invalid farmer location ({}, {})",
                request.farmer_lat, request.farmer_lon
            )));
        }

        let reference = &self.reference;
        let target = reference
            .crops
            .lookup(&request.crop_type)
            .ok_or_else(|| MarketError::NotFound(format!("crop '{}' not found", request.crop_type)))?;

        let predicted_class = self.classifier.classify(target.as_vector()).await?;
        let waste_label = reference
            .waste_classes
            .resolve(predicted_class)
            .ok_or_else(|| {
                MarketError::NotFound(format!("waste class {predicted_class} is not mapped"))
            })?;
        let nutrients = reference.nutrients.get(waste_label).ok_or_else(|| {
            MarketError::NotFound(format!("no nutrient data for waste '{waste_label}'"))
        })?;

        let deficiencies = self.evaluator.evaluate(&soil, target);
        let video_link = recipe_video_link(waste_label, &deficiencies);

        let snapshot = self.ledger.snapshot();
        let mut suppliers = self.matcher.rank(&snapshot, farmer, waste_label);
        for ranked in &mut suppliers {
            if let Some(producer) = reference.producers.get(&ranked.offer.producer_id) {
                ranked.producer_name = Some(producer.name.clone());
                ranked.contact = Some(producer.contact.clone());
            }
        }

        debug!(
            crop = %target.label,
            class_id = predicted_class,
            threshold = self.evaluator.threshold(),
            ?deficiencies,
            "Recommendation computed"
        );
        info!(
            crop = %target.label,
            waste = waste_label,
            suppliers = suppliers.len(),
            "Recommendation served"
        );

        Ok(Recommendation {
            crop_target: request.crop_type.clone(),
            soil_status: soil_status(&deficiencies),
            deficiencies,
            predicted_class,
            recommended_waste: waste_label.to_string(),
            recommended_nutrients: nutrients.clone(),
            video_recommendation_link: video_link,
            location_message: format!(
                "Predicted class {predicted_class}. Ranked offers by lowest price per kg."
            ),
            nearest_suppliers: suppliers,
        })
    }
}
