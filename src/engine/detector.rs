//! Vision detector seam for seller photo uploads.
//!
//! A detector turns image bytes into labelled items with a quantity proxy.
//! Like the classifier, it is opaque: [`DetectorAdapter`] adds the timeout
//! and maps every failure to [`MarketError::ModelUnavailable`], which the
//! supply flow treats as a soft failure and falls back to manual input.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{MarketError, MarketResult};
use crate::types::DetectedItem;

#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect waste items in an encoded image.
    async fn detect(&self, image: &[u8]) -> Result<Vec<DetectedItem>>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Timeout-bounded wrapper around a [`Detector`].
#[derive(Clone)]
pub struct DetectorAdapter {
    detector: Arc<dyn Detector>,
    timeout: Duration,
}

impl DetectorAdapter {
    pub fn new(detector: Arc<dyn Detector>, timeout: Duration) -> Self {
        Self { detector, timeout }
    }

    pub fn backend_name(&self) -> &'static str {
        self.detector.backend_name()
    }

    pub async fn detect(&self, image: &[u8]) -> MarketResult<Vec<DetectedItem>> {
        if image.is_empty() {
            return Err(MarketError::Validation("image is empty".to_string()));
        }

        match tokio::time::timeout(self.timeout, self.detector.detect(image)).await {
            Ok(Ok(items)) => {
                debug!(backend = self.backend_name(), items = items.len(), "Detection complete");
                Ok(items)
            }
            Ok(Err(e)) => {
                warn!(backend = self.backend_name(), error = %e, "Detector failed");
                Err(MarketError::ModelUnavailable(format!(
                    "{} detector failed: {e:#}",
                    self.backend_name()
                )))
            }
            Err(_) => {
                warn!(
                    backend = self.backend_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Detector timed out"
                );
                Err(MarketError::ModelUnavailable(format!(
                    "{} detector timed out after {}ms",
                    self.backend_name(),
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

// ============================================================================
// Backends
// ============================================================================

/// Used when no detector endpoint is configured. Every photo upload falls
/// through to the manual fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableDetector;

#[async_trait]
impl Detector for UnavailableDetector {
    async fn detect(&self, _image: &[u8]) -> Result<Vec<DetectedItem>> {
        bail!("no detector endpoint configured")
    }

    fn backend_name(&self) -> &'static str {
        "unavailable"
    }
}

/// One detection as reported by an inference server.
///
/// The quantity proxy may arrive as an explicit weight, a 1-10 relative
/// score, or a bounding box whose area is used.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDetection {
    pub label: String,
    #[serde(default)]
    pub quantity_weight: Option<f64>,
    #[serde(default)]
    pub relative_quantity_score: Option<f64>,
    #[serde(default)]
    pub box_w: Option<f64>,
    #[serde(default)]
    pub box_h: Option<f64>,
}

impl RawDetection {
    /// Normalize to a [`DetectedItem`]. Missing, negative or non-finite
    /// weights become zero and are ignored by the scorer.
    pub fn into_item(self) -> DetectedItem {
        let weight = self
            .quantity_weight
            .or(self.relative_quantity_score)
            .or_else(|| match (self.box_w, self.box_h) {
                (Some(w), Some(h)) => Some(w * h),
                _ => None,
            })
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(0.0);

        DetectedItem {
            label: self.label,
            quantity_weight: weight,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionResponse {
    Wrapped { detections: Vec<RawDetection> },
    List(Vec<RawDetection>),
}

/// Posts raw image bytes to an external detector.
#[derive(Debug, Clone)]
pub struct HttpDetector {
    http: reqwest::Client,
    url: String,
}

impl HttpDetector {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build detector HTTP client")?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Detector for HttpDetector {
    async fn detect(&self, image: &[u8]) -> Result<Vec<DetectedItem>> {
        let resp = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            bail!("detector server returned status {status}");
        }

        let detections = match resp.json::<DetectionResponse>().await? {
            DetectionResponse::Wrapped { detections } | DetectionResponse::List(detections) => {
                detections
            }
        };
        Ok(detections.into_iter().map(RawDetection::into_item).collect())
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(Vec<DetectedItem>);

    #[async_trait]
    impl Detector for FixedDetector {
        async fn detect(&self, _image: &[u8]) -> Result<Vec<DetectedItem>> {
            Ok(self.0.clone())
        }

        fn backend_name(&self) -> &'static str {
            "fixed"
        }
    }

    struct HangingDetector;

    #[async_trait]
    impl Detector for HangingDetector {
        async fn detect(&self, _image: &[u8]) -> Result<Vec<DetectedItem>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        fn backend_name(&self) -> &'static str {
            "hanging"
        }
    }

    #[tokio::test]
    async fn test_passes_items_through() {
        let items = vec![DetectedItem::new("Banana", 3.0)];
        let adapter = DetectorAdapter::new(Arc::new(FixedDetector(items.clone())), Duration::from_secs(1));
        assert_eq!(adapter.detect(b"jpeg").await.unwrap(), items);
    }

    #[tokio::test]
    async fn test_unavailable_detector_is_soft_failure() {
        let adapter = DetectorAdapter::new(Arc::new(UnavailableDetector), Duration::from_secs(1));
        let err = adapter.detect(b"jpeg").await.unwrap_err();
        assert!(matches!(err, MarketError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_soft_failure() {
        let adapter = DetectorAdapter::new(Arc::new(HangingDetector), Duration::from_millis(20));
        let err = adapter.detect(b"jpeg").await.unwrap_err();
        assert!(matches!(err, MarketError::ModelUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_image_rejected() {
        let adapter = DetectorAdapter::new(Arc::new(UnavailableDetector), Duration::from_secs(1));
        assert!(matches!(
            adapter.detect(&[]).await.unwrap_err(),
            MarketError::Validation(_)
        ));
    }

    #[test]
    fn test_raw_detection_weight_sources() {
        let parse = |json: &str| {
            serde_json::from_str::<RawDetection>(json)
                .unwrap()
                .into_item()
                .quantity_weight
        };
        assert_eq!(parse(r#"{"label":"Fish","quantity_weight":2.5}"#), 2.5);
        assert_eq!(parse(r#"{"label":"Fish","relative_quantity_score":7}"#), 7.0);
        assert_eq!(parse(r#"{"label":"Fish","box_w":4.0,"box_h":0.5}"#), 2.0);
        assert_eq!(parse(r#"{"label":"Fish","box_w":4.0}"#), 0.0);
        assert_eq!(parse(r#"{"label":"Fish","quantity_weight":-1.0}"#), 0.0);
    }

    #[test]
    fn test_detection_response_shapes() {
        let wrapped: DetectionResponse =
            serde_json::from_str(r#"{"detections":[{"label":"Bone","quantity_weight":1.0}]}"#).unwrap();
        let list: DetectionResponse =
            serde_json::from_str(r#"[{"label":"Bone","quantity_weight":1.0}]"#).unwrap();
        for response in [wrapped, list] {
            let (DetectionResponse::Wrapped { detections } | DetectionResponse::List(detections)) =
                response;
            assert_eq!(detections.len(), 1);
            assert_eq!(detections[0].label, "Bone");
        }
    }
}
