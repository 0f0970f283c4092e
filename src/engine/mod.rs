//! Matching engine: deficiency evaluation, model adapters, nutrient scoring
//! and offer ranking.
//!
//! Everything here is pure or bounded by a timeout. Shared state (reference
//! tables, the offer ledger) is passed in by the market services.

pub mod classifier;
pub mod deficiency;
pub mod detector;
pub mod geo;
pub mod matcher;
pub mod scorer;
pub mod video;

pub use classifier::{ClassifierAdapter, HttpClassifier, ProfileSimilarityClassifier, WasteClassifier};
pub use deficiency::DeficiencyEvaluator;
pub use detector::{Detector, DetectorAdapter, HttpDetector, RawDetection, UnavailableDetector};
pub use geo::haversine_km;
pub use matcher::OfferMatcher;
pub use scorer::NutrientScorer;
pub use video::recipe_video_link;
