//! Seller-side flow: photo analysis or manual entry in, listed offer out.
//!
//! A photo is tried first. When detection fails, times out or recognizes
//! nothing, complete manual fields take over. The offer is scored, stamped
//! with the producer's coordinates and appended to the ledger.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::Marketplace;
use crate::engine::NutrientScorer;
use crate::error::{MarketError, MarketResult};
use crate::types::{NewOffer, NpkVector, WeightedScore};

/// A seller's listing request.
#[derive(Debug, Clone, Default)]
pub struct SupplyRequest {
    pub producer_id: String,
    pub cost_per_kg: f64,
    pub image: Option<Vec<u8>>,
    pub manual_waste_type: Option<String>,
    pub manual_quantity_kg: Option<f64>,
}

/// Where the listed waste type and quantity came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Vision,
    Manual,
    /// Photo analysis failed and the manual fields were used instead
    ManualFallback,
}

impl InputSource {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Vision => "Data sourced via vision analysis.",
            Self::Manual => "Data provided manually by seller.",
            Self::ManualFallback => "Vision analysis unavailable; data provided manually by seller.",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferDetails {
    pub waste_type: String,
    pub calculated_npk_score: NpkVector,
    /// Listed quantity rounded to 2 dp
    pub estimated_quantity: f64,
    pub seller_price_per_kg: f64,
    pub producer_id: String,
}

/// Response to a successful listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfferReceipt {
    pub status: String,
    pub listing_id: String,
    pub seller_input_source: InputSource,
    pub source_message: String,
    pub final_offer_details: OfferDetails,
}

/// Complete manual override: both fields present.
struct ManualEntry {
    waste_type: String,
    quantity_kg: f64,
}

impl SupplyRequest {
    fn manual_entry(&self) -> MarketResult<Option<ManualEntry>> {
        if let Some(quantity) = self.manual_quantity_kg {
            if !(quantity.is_finite() && quantity > 0.0) {
                return Err(MarketError::Validation(format!(
                    "manual_quantity_kg must be positive, got {quantity}"
                )));
            }
        }

        let waste_type = self
            .manual_waste_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        Ok(match (waste_type, self.manual_quantity_kg) {
            (Some(waste_type), Some(quantity_kg)) => Some(ManualEntry {
                waste_type: waste_type.to_string(),
                quantity_kg,
            }),
            _ => None,
        })
    }
}

/// What the photo analysis produced.
enum VisionOutcome {
    Scored(WeightedScore),
    NothingRecognized,
    Unavailable(MarketError),
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Marketplace {
    /// Score and list a seller offer.
    pub async fn submit_offer(&self, request: SupplyRequest) -> MarketResult<OfferReceipt> {
        if !(request.cost_per_kg.is_finite() && request.cost_per_kg > 0.0) {
            return Err(MarketError::Validation(format!(
                "cost_per_kg must be positive, got {}",
                request.cost_per_kg
            )));
        }
        let producer = self
            .reference
            .producers
            .get(&request.producer_id)
            .ok_or_else(|| {
                MarketError::NotFound(format!("producer '{}' not found", request.producer_id))
            })?;
        let manual = request.manual_entry()?;
        let scorer = NutrientScorer::new(&self.reference.nutrients);

        let vision = match &request.image {
            Some(image) => Some(self.analyze_photo(image).await?),
            None => None,
        };

        let (source, waste_type, quantity_kg, npk_score) = match (vision, manual) {
            (Some(VisionOutcome::Scored(score)), _) => {
                let waste_type = score.dominant_label.ok_or_else(|| {
                    MarketError::ModelUnavailable("detection produced no dominant label".to_string())
                })?;
                (InputSource::Vision, waste_type, score.total_weight, score.combined_score)
            }
            (Some(outcome), Some(entry)) => {
                let reason = match outcome {
                    VisionOutcome::Unavailable(e) => e.to_string(),
                    _ => "no recognized waste in photo".to_string(),
                };
                warn!(
                    producer_id = %request.producer_id,
                    reason = %reason,
                    "Vision analysis failed, falling back to manual input"
                );
                let npk = scorer.score_single(&entry.waste_type, entry.quantity_kg)?;
                (InputSource::ManualFallback, entry.waste_type, entry.quantity_kg, npk)
            }
            (Some(VisionOutcome::Unavailable(e)), None) => return Err(e),
            (Some(_), None) => {
                return Err(MarketError::Validation(
                    "no recognized organic waste detected; provide manual_waste_type and \
                     manual_quantity_kg"
                        .to_string(),
                ))
            }
            (None, Some(entry)) => {
                let npk = scorer.score_single(&entry.waste_type, entry.quantity_kg)?;
                (InputSource::Manual, entry.waste_type, entry.quantity_kg, npk)
            }
            (None, None) => {
                return Err(MarketError::Validation(
                    "must upload an image or provide both manual_waste_type and \
                     manual_quantity_kg"
                        .to_string(),
                ))
            }
        };

        let offer = NewOffer {
            producer_id: producer.producer_id.clone(),
            waste_type,
            quantity_kg,
            cost_per_kg: request.cost_per_kg,
            npk_score,
            producer_location: producer.location(),
        };
        if !offer.is_finite() {
            return Err(MarketError::Validation(format!(
                "quantity {quantity_kg} of '{}' is too large to score",
                offer.waste_type
            )));
        }

        let listed = self.ledger.append(offer).await?;

        info!(
            offer_id = %listed.offer_id,
            producer_id = %listed.producer_id,
            waste_type = %listed.waste_type,
            source = ?source,
            "Offer listed"
        );

        Ok(OfferReceipt {
            status: "Offer Listed".to_string(),
            listing_id: listed.offer_id.clone(),
            seller_input_source: source,
            source_message: source.message().to_string(),
            final_offer_details: OfferDetails {
                waste_type: listed.waste_type.clone(),
                calculated_npk_score: listed.npk_score(),
                estimated_quantity: round2(listed.quantity_kg),
                seller_price_per_kg: listed.cost_per_kg,
                producer_id: listed.producer_id,
            },
        })
    }

    /// Run the detector and score what it found. Only bad input is an error;
    /// model failures come back as an outcome so the caller can fall back.
    async fn analyze_photo(&self, image: &[u8]) -> MarketResult<VisionOutcome> {
        let items = match self.detector.detect(image).await {
            Ok(items) => items,
            Err(e @ MarketError::ModelUnavailable(_)) => return Ok(VisionOutcome::Unavailable(e)),
            Err(e) => return Err(e),
        };

        let score = NutrientScorer::new(&self.reference.nutrients).score_weighted(&items);
        Ok(if score.is_success() {
            VisionOutcome::Scored(score)
        } else {
            VisionOutcome::NothingRecognized
        })
    }
}
