//! Marketplace services
//!
//! [`Marketplace`] owns everything a request needs: the read-only reference
//! tables, the offer ledger and the two model adapters. Handlers share one
//! instance behind an `Arc`.

mod recommendation;
mod supply;

pub use recommendation::{FarmerRequest, Recommendation};
pub use supply::{InputSource, OfferDetails, OfferReceipt, SupplyRequest};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::{MarketConfig, MatchingConfig};
use crate::engine::{
    ClassifierAdapter, DeficiencyEvaluator, Detector, DetectorAdapter, HttpClassifier,
    HttpDetector, OfferMatcher, ProfileSimilarityClassifier, UnavailableDetector, WasteClassifier,
};
use crate::reference::ReferenceData;
use crate::storage::{self, OfferLedger};
use crate::types::SellerOffer;

pub struct Marketplace {
    reference: Arc<ReferenceData>,
    ledger: Arc<OfferLedger>,
    classifier: ClassifierAdapter,
    detector: DetectorAdapter,
    evaluator: DeficiencyEvaluator,
    matcher: OfferMatcher,
}

impl Marketplace {
    pub fn new(
        reference: Arc<ReferenceData>,
        ledger: Arc<OfferLedger>,
        classifier: ClassifierAdapter,
        detector: DetectorAdapter,
        matching: &MatchingConfig,
    ) -> Self {
        Self {
            reference,
            ledger,
            classifier,
            detector,
            evaluator: DeficiencyEvaluator::new(matching.deficiency_threshold),
            matcher: OfferMatcher::from_config(matching),
        }
    }

    /// Build the full service from configuration: reference tables, the
    /// configured offer store (restored into the ledger) and model backends.
    pub async fn bootstrap(config: &MarketConfig) -> Result<Self> {
        let reference = Arc::new(
            ReferenceData::load(config.reference.path.as_deref())
                .context("Failed to load reference data")?,
        );

        let sink = storage::open_sink(config.storage.backend, &config.storage.data_dir)
            .with_context(|| {
                format!(
                    "Failed to open {} offer store in {}",
                    config.storage.backend,
                    config.storage.data_dir.display()
                )
            })?;
        let ledger = Arc::new(
            OfferLedger::open(sink, config.timeouts.persistence())
                .await
                .context("Failed to restore offer ledger")?,
        );

        let model: Arc<dyn WasteClassifier> = match &config.models.classifier_url {
            Some(url) => Arc::new(HttpClassifier::new(url, config.timeouts.classifier())?),
            None => Arc::new(ProfileSimilarityClassifier::from_reference(&reference)),
        };
        let detector: Arc<dyn Detector> = match &config.models.detector_url {
            Some(url) => Arc::new(HttpDetector::new(url, config.timeouts.detector())?),
            None => Arc::new(UnavailableDetector),
        };

        info!(
            classifier = model.backend_name(),
            detector = detector.backend_name(),
            store = ledger.backend_name(),
            offers = ledger.len(),
            "Marketplace ready"
        );

        Ok(Self::new(
            reference,
            ledger,
            ClassifierAdapter::new(model, config.timeouts.classifier()),
            DetectorAdapter::new(detector, config.timeouts.detector()),
            &config.matching,
        ))
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn ledger(&self) -> &OfferLedger {
        &self.ledger
    }

    /// Listed offers still available, optionally of one waste type, in
    /// listing order.
    pub fn available_offers(&self, waste_type: Option<&str>) -> Vec<SellerOffer> {
        self.ledger
            .snapshot()
            .iter()
            .filter(|o| o.is_available && waste_type.map_or(true, |w| o.waste_type == w))
            .cloned()
            .collect()
    }
}
