//! Shared data structures for the nutrient exchange
//!
//! - Nutrients: NpkVector, SoilProfile, CropTarget, NutrientConcentration
//! - Offers: Producer, NewOffer, SellerOffer, RankedOffer
//! - Detection: DetectedItem, WeightedScore

mod nutrients;
mod offers;
mod detection;

pub use nutrients::*;
pub use offers::*;
pub use detection::*;
