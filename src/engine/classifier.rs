//! Waste classifier seam.
//!
//! The model itself is opaque: given a crop's `{N, P, K}` target it returns a
//! waste class id. [`ClassifierAdapter`] bounds each call with a timeout and
//! folds every failure into [`MarketError::ModelUnavailable`].
//!
//! Two backends ship with the service:
//! - [`ProfileSimilarityClassifier`]: in-process, picks the waste whose
//!   nutrient profile points the same way as the target (cosine similarity)
//! - [`HttpClassifier`]: forwards the target to an external inference server

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{MarketError, MarketResult};
use crate::reference::{ReferenceData, WasteClassId};
use crate::types::NpkVector;

/// An opaque target-to-waste-class model.
#[async_trait]
pub trait WasteClassifier: Send + Sync {
    /// Predict the waste class for a crop nutrient target.
    async fn predict(&self, target: NpkVector) -> Result<WasteClassId>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

// ============================================================================
// Adapter
// ============================================================================

/// Timeout-bounded wrapper around a [`WasteClassifier`].
#[derive(Clone)]
pub struct ClassifierAdapter {
    model: Arc<dyn WasteClassifier>,
    timeout: Duration,
}

impl ClassifierAdapter {
    pub fn new(model: Arc<dyn WasteClassifier>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub fn backend_name(&self) -> &'static str {
        self.model.backend_name()
    }

    /// Classify a target vector.
    ///
    /// Errors, malformed output and timeouts all map to `ModelUnavailable`.
    pub async fn classify(&self, target: NpkVector) -> MarketResult<WasteClassId> {
        match tokio::time::timeout(self.timeout, self.model.predict(target)).await {
            Ok(Ok(class_id)) => {
                debug!(backend = self.backend_name(), class_id, "Classifier prediction");
                Ok(class_id)
            }
            Ok(Err(e)) => {
                warn!(backend = self.backend_name(), error = %e, "Classifier failed");
                Err(MarketError::ModelUnavailable(format!(
                    "{} classifier failed: {e:#}",
                    self.backend_name()
                )))
            }
            Err(_) => {
                warn!(
                    backend = self.backend_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classifier timed out"
                );
                Err(MarketError::ModelUnavailable(format!(
                    "{} classifier timed out after {}ms",
                    self.backend_name(),
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

// ============================================================================
// Profile similarity backend
// ============================================================================

/// Picks the waste class whose nutrient concentration has the highest cosine
/// similarity to the target. Ties go to the lowest class id.
#[derive(Debug, Clone)]
pub struct ProfileSimilarityClassifier {
    profiles: Vec<(WasteClassId, NpkVector)>,
}

impl ProfileSimilarityClassifier {
    /// Profiles for every class that has a nutrient row, in ascending id order.
    pub fn from_reference(reference: &ReferenceData) -> Self {
        let profiles = reference
            .waste_classes
            .iter()
            .filter_map(|(id, label)| {
                reference
                    .nutrients
                    .get(label)
                    .map(|row| (id, row.as_vector()))
            })
            .collect();
        Self { profiles }
    }

    pub fn predict_sync(&self, target: NpkVector) -> Result<WasteClassId> {
        if !target.is_finite() {
            bail!("target vector is not finite");
        }
        let target_mag = target.magnitude();
        if target_mag == 0.0 {
            bail!("target vector has zero magnitude");
        }

        let mut best: Option<(WasteClassId, f64)> = None;
        for (id, profile) in &self.profiles {
            let mag = profile.magnitude();
            if mag == 0.0 {
                continue;
            }
            let similarity = target.dot(profile) / (target_mag * mag);
            if best.map_or(true, |(_, s)| similarity > s) {
                best = Some((*id, similarity));
            }
        }

        best.map(|(id, _)| id)
            .context("no waste class has a usable nutrient profile")
    }
}

#[async_trait]
impl WasteClassifier for ProfileSimilarityClassifier {
    async fn predict(&self, target: NpkVector) -> Result<WasteClassId> {
        self.predict_sync(target)
    }

    fn backend_name(&self) -> &'static str {
        "profile-similarity"
    }
}

// ============================================================================
// HTTP backend
// ============================================================================

/// Response shapes accepted from an inference server.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionResponse {
    Object { class_id: WasteClassId },
    Bare(WasteClassId),
    Batch(Vec<WasteClassId>),
}

/// Forwards `{"N", "P", "K"}` to an external model over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    http: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build classifier HTTP client")?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl WasteClassifier for HttpClassifier {
    async fn predict(&self, target: NpkVector) -> Result<WasteClassId> {
        let resp = self.http.post(&self.url).json(&target).send().await?;
        let status = resp.status();
        if !status.is_success() {
            bail!("classifier server returned status {status}");
        }

        match resp.json::<PredictionResponse>().await? {
            PredictionResponse::Object { class_id } | PredictionResponse::Bare(class_id) => {
                Ok(class_id)
            }
            PredictionResponse::Batch(ids) => ids
                .first()
                .copied()
                .context("classifier returned an empty prediction batch"),
        }
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowClassifier;

    #[async_trait]
    impl WasteClassifier for SlowClassifier {
        async fn predict(&self, _target: NpkVector) -> Result<WasteClassId> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0)
        }

        fn backend_name(&self) -> &'static str {
            "slow"
        }
    }

    struct BrokenClassifier;

    #[async_trait]
    impl WasteClassifier for BrokenClassifier {
        async fn predict(&self, _target: NpkVector) -> Result<WasteClassId> {
            bail!("weights file missing")
        }

        fn backend_name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_model_unavailable() {
        let adapter = ClassifierAdapter::new(Arc::new(SlowClassifier), Duration::from_millis(50));
        let err = adapter.classify(NpkVector::new(90.0, 45.0, 45.0)).await.unwrap_err();
        assert!(matches!(err, MarketError::ModelUnavailable(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_model_error_maps_to_model_unavailable() {
        let adapter = ClassifierAdapter::new(Arc::new(BrokenClassifier), Duration::from_secs(1));
        let err = adapter.classify(NpkVector::new(1.0, 1.0, 1.0)).await.unwrap_err();
        assert!(matches!(err, MarketError::ModelUnavailable(_)));
        assert!(err.to_string().contains("weights file missing"));
    }

    #[tokio::test]
    async fn test_similarity_picks_matching_profile() {
        let reference = ReferenceData::builtin().unwrap();
        let classifier = ProfileSimilarityClassifier::from_reference(&reference);
        let adapter = ClassifierAdapter::new(Arc::new(classifier), Duration::from_secs(1));

        // Phosphorus-heavy target points at bone meal
        let class_id = adapter.classify(NpkVector::new(40.0, 100.0, 2.0)).await.unwrap();
        assert_eq!(reference.waste_classes.resolve(class_id), Some("Bone"));

        // Potassium-heavy target points at banana
        let class_id = adapter.classify(NpkVector::new(10.0, 2.5, 42.0)).await.unwrap();
        assert_eq!(reference.waste_classes.resolve(class_id), Some("Banana"));
    }

    #[test]
    fn test_similarity_is_deterministic() {
        let reference = ReferenceData::builtin().unwrap();
        let classifier = ProfileSimilarityClassifier::from_reference(&reference);
        let target = NpkVector::new(90.0, 45.0, 45.0);
        let first = classifier.predict_sync(target).unwrap();
        for _ in 0..10 {
            assert_eq!(classifier.predict_sync(target).unwrap(), first);
        }
    }

    #[test]
    fn test_similarity_rejects_zero_target() {
        let reference = ReferenceData::builtin().unwrap();
        let classifier = ProfileSimilarityClassifier::from_reference(&reference);
        assert!(classifier.predict_sync(NpkVector::zero()).is_err());
        assert!(classifier.predict_sync(NpkVector::new(f64::NAN, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_prediction_response_shapes() {
        let parse = |s: &str| match serde_json::from_str::<PredictionResponse>(s).unwrap() {
            PredictionResponse::Object { class_id } | PredictionResponse::Bare(class_id) => {
                class_id
            }
            PredictionResponse::Batch(ids) => ids[0],
        };
        assert_eq!(parse(r#"{"class_id": 4}"#), 4);
        assert_eq!(parse("3"), 3);
        assert_eq!(parse("[7]"), 7);
    }
}
