//! OfferSink trait: pluggable durable store for the offer ledger
//!
//! The ledger hands a sink the complete candidate collection on every
//! append and only publishes it once the sink returns `Ok`:
//! - `SledOfferSink`: sled tree keyed by offer sequence (default)
//! - `JsonFileSink`: one JSON file, atomically replaced
//! - `InMemorySink`: non-durable, for tests and throwaway deployments

use std::time::Duration;

use crate::types::SellerOffer;

/// Durable store for the offer collection.
///
/// Implementations must be thread-safe (Send + Sync). `flush` is called from
/// a blocking thread, one call at a time, and must either store the whole
/// collection or return an error.
pub trait OfferSink: Send + Sync {
    /// Durably replace the stored collection with `offers`.
    fn flush(&self, offers: &[SellerOffer]) -> Result<(), PersistenceError>;

    /// Load the stored collection in creation order.
    fn load(&self) -> Result<Vec<SellerOffer>, PersistenceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("flush did not complete within {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<sled::Error> for PersistenceError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// In-memory sink for tests and minimal deployments
///
/// Thread-safe via `RwLock`. Not durable, data is lost on restart. Flushes can
/// be made to fail on demand.
#[derive(Default)]
pub struct InMemorySink {
    offers: std::sync::RwLock<Vec<SellerOffer>>,
    failing: std::sync::atomic::AtomicBool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink pre-loaded with `offers`, as if restored from a previous run.
    pub fn with_offers(offers: Vec<SellerOffer>) -> Self {
        Self {
            offers: std::sync::RwLock::new(offers),
            failing: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Make every subsequent flush fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// What a restart would see.
    pub fn stored(&self) -> Result<Vec<SellerOffer>, PersistenceError> {
        self.load()
    }
}

impl OfferSink for InMemorySink {
    fn flush(&self, offers: &[SellerOffer]) -> Result<(), PersistenceError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(PersistenceError::Storage("injected flush failure".to_string()));
        }

        let mut store = self
            .offers
            .write()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        *store = offers.to_vec();
        Ok(())
    }

    fn load(&self) -> Result<Vec<SellerOffer>, PersistenceError> {
        let store = self
            .offers
            .read()
            .map_err(|e| PersistenceError::Storage(e.to_string()))?;
        Ok(store.clone())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::types::SellerOffer;

    pub fn offer(sequence: u64, waste_type: &str) -> SellerOffer {
        SellerOffer {
            offer_id: format!("O-{sequence:06}-ABCDEF01"),
            sequence,
            producer_id: "P-001".to_string(),
            waste_type: waste_type.to_string(),
            quantity_kg: 12.5,
            cost_per_kg: 2.0,
            is_available: true,
            listed_at: Utc::now(),
            n_score: 125.0,
            p_score: 31.25,
            k_score: 525.0,
            producer_latitude: 28.7041,
            producer_longitude: 77.1025,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::offer;
    use super::*;

    #[test]
    fn test_in_memory_flush_and_load() {
        let sink = InMemorySink::new();
        sink.flush(&[offer(1, "Banana"), offer(2, "Bone")]).unwrap();

        let loaded = sink.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].waste_type, "Bone");
    }

    #[test]
    fn test_injected_failure_keeps_previous_state() {
        let sink = InMemorySink::with_offers(vec![offer(1, "Banana")]);
        sink.set_failing(true);
        assert!(matches!(
            sink.flush(&[offer(1, "Banana"), offer(2, "Bone")]),
            Err(PersistenceError::Storage(_))
        ));
        assert_eq!(sink.stored().unwrap().len(), 1);

        sink.set_failing(false);
        sink.flush(&[offer(1, "Banana"), offer(2, "Bone")]).unwrap();
        assert_eq!(sink.stored().unwrap().len(), 2);
    }

    #[test]
    fn test_trait_object() {
        let sink: Box<dyn OfferSink> = Box::new(InMemorySink::new());
        assert_eq!(sink.backend_name(), "InMemory");
        assert!(sink.load().unwrap().is_empty());
    }

    #[test]
    fn test_timeout_message() {
        let err = PersistenceError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "flush did not complete within 250ms");
    }
}
