//! Nutrient Exchange: organic-waste fertilizer matching
//!
//! Matches a farmer's soil-nutrient deficit to a recommended organic waste
//! and ranks nearby sellers of that waste by price and distance. Sellers list
//! waste from a photo analysis or manual entry.
//!
//! ## Architecture
//!
//! - **Reference data**: nutrient concentrations, crop targets, waste classes, producers
//! - **Engine**: deficiency evaluation, classifier/detector adapters, scoring, ranking
//! - **Storage**: append-only offer ledger over a durable sink (sled, JSON or memory)
//! - **Market**: recommendation and supply flows over the engine and ledger
//! - **API**: axum HTTP surface

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod market;
pub mod reference;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::MarketConfig;

// Re-export errors
pub use error::{MarketError, MarketResult};

// Re-export commonly used types
pub use types::{
    CropTarget, DetectedItem, GeoPoint, NewOffer, NpkVector, Nutrient, NutrientConcentration,
    Producer, RankedOffer, ScoreStatus, SellerOffer, SoilProfile, WeightedScore,
};

// Re-export services
pub use market::{FarmerRequest, Marketplace, OfferReceipt, Recommendation, SupplyRequest};

// Re-export storage
pub use storage::{OfferLedger, OfferSink, PersistenceError};
