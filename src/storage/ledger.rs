//! Offer ledger: the append-only collection of seller offers.
//!
//! Writers are serialized by an async mutex. Each append builds a candidate
//! collection, hands it to the sink on a blocking thread under a timeout and
//! publishes it only after the sink confirms. Readers take lock-free
//! snapshots through `ArcSwap` and never observe a half-applied append.
//!
//! A flush that times out keeps running on its blocking thread. Its handle
//! is kept under the writer lock and the next append waits for it before
//! starting another flush, so the sink never sees two flushes at once and
//! the newest published collection is always the last one written.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::persistence::{OfferSink, PersistenceError};
use crate::types::{NewOffer, SellerOffer};

type FlushHandle = JoinHandle<Result<(), PersistenceError>>;

/// State owned by the current writer. Holding the guard is the write lock.
struct WriterState {
    next_sequence: u64,
    /// Flush that outlived its timeout and may still be writing
    stale_flush: Option<FlushHandle>,
}

pub struct OfferLedger {
    offers: ArcSwap<Vec<SellerOffer>>,
    writer: Mutex<WriterState>,
    sink: Arc<dyn OfferSink>,
    flush_timeout: Duration,
}

impl OfferLedger {
    /// Restore the ledger from `sink`.
    ///
    /// Sequence numbers resume after the highest stored one.
    pub async fn open(
        sink: Arc<dyn OfferSink>,
        flush_timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        let loader = Arc::clone(&sink);
        let mut offers = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| PersistenceError::Storage(format!("load task failed: {e}")))??;
        offers.sort_by_key(|o| o.sequence);

        let next_sequence = offers.last().map_or(1, |o| o.sequence + 1);
        info!(
            backend = sink.backend_name(),
            restored = offers.len(),
            next_sequence,
            "Offer ledger opened"
        );

        Ok(Self {
            offers: ArcSwap::from_pointee(offers),
            writer: Mutex::new(WriterState {
                next_sequence,
                stale_flush: None,
            }),
            sink,
            flush_timeout,
        })
    }

    /// Current collection. Later appends never change a returned snapshot.
    pub fn snapshot(&self) -> Arc<Vec<SellerOffer>> {
        self.offers.load_full()
    }

    pub fn len(&self) -> usize {
        self.offers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn backend_name(&self) -> &'static str {
        self.sink.backend_name()
    }

    /// Persist and then publish a new offer.
    ///
    /// On any persistence failure or timeout the visible collection is left
    /// unchanged. Sequence numbers are never reused, even after a failure.
    /// Offers with non-finite quantities or scores are refused before a
    /// sequence number is assigned.
    pub async fn append(&self, new: NewOffer) -> Result<SellerOffer, PersistenceError> {
        if !new.is_finite() {
            return Err(PersistenceError::Serialization(format!(
                "offer of '{}' has a non-finite quantity, cost or score",
                new.waste_type
            )));
        }

        let mut writer = self.writer.lock().await;
        self.settle_stale_flush(&mut writer).await?;

        let sequence = writer.next_sequence;
        writer.next_sequence += 1;

        let offer = SellerOffer {
            offer_id: offer_id(sequence),
            sequence,
            producer_id: new.producer_id,
            waste_type: new.waste_type,
            quantity_kg: new.quantity_kg,
            cost_per_kg: new.cost_per_kg,
            is_available: true,
            listed_at: Utc::now(),
            n_score: new.npk_score.n,
            p_score: new.npk_score.p,
            k_score: new.npk_score.k,
            producer_latitude: new.producer_location.latitude,
            producer_longitude: new.producer_location.longitude,
        };

        let current = self.offers.load_full();
        let mut candidate = Vec::with_capacity(current.len() + 1);
        candidate.extend(current.iter().cloned());
        candidate.push(offer.clone());
        let candidate = Arc::new(candidate);

        if let Err(e) = self.persist(&mut writer, Arc::clone(&candidate)).await {
            warn!(
                offer_id = %offer.offer_id,
                backend = self.sink.backend_name(),
                error = %e,
                "Offer not persisted, ledger unchanged"
            );
            return Err(e);
        }

        self.offers.store(candidate);
        debug!(offer_id = %offer.offer_id, waste_type = %offer.waste_type, "Offer listed");
        Ok(offer)
    }

    /// Wait for a flush left over from a timed-out append.
    ///
    /// Its outcome no longer matters: the collection it wrote was never
    /// published and the next flush replaces it. If it is still running
    /// after another `flush_timeout`, the append fails without consuming a
    /// sequence number.
    async fn settle_stale_flush(&self, writer: &mut WriterState) -> Result<(), PersistenceError> {
        let Some(mut stale) = writer.stale_flush.take() else {
            return Ok(());
        };

        match tokio::time::timeout(self.flush_timeout, &mut stale).await {
            Ok(outcome) => {
                debug!(
                    succeeded = matches!(outcome, Ok(Ok(()))),
                    "Stale flush finished, store will be rewritten"
                );
                Ok(())
            }
            Err(_) => {
                warn!(
                    backend = self.sink.backend_name(),
                    "Previous flush still running, refusing to start another"
                );
                writer.stale_flush = Some(stale);
                Err(PersistenceError::Timeout(self.flush_timeout))
            }
        }
    }

    async fn persist(
        &self,
        writer: &mut WriterState,
        candidate: Arc<Vec<SellerOffer>>,
    ) -> Result<(), PersistenceError> {
        let sink = Arc::clone(&self.sink);
        let mut task: FlushHandle = tokio::task::spawn_blocking(move || sink.flush(&candidate));

        match tokio::time::timeout(self.flush_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PersistenceError::Storage(format!("flush task failed: {e}"))),
            Err(_) => {
                writer.stale_flush = Some(task);
                Err(PersistenceError::Timeout(self.flush_timeout))
            }
        }
    }
}

/// `O-<sequence>-<random suffix>`, unique and sortable by creation order.
fn offer_id(sequence: u64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("O-{sequence:06}-{}", suffix[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::persistence::test_support::offer;
    use crate::storage::InMemorySink;
    use crate::types::{GeoPoint, NpkVector};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn new_offer(waste_type: &str) -> NewOffer {
        NewOffer {
            producer_id: "P-001".to_string(),
            waste_type: waste_type.to_string(),
            quantity_kg: 10.0,
            cost_per_kg: 1.5,
            npk_score: NpkVector::new(100.0, 25.0, 420.0),
            producer_location: GeoPoint::new(28.7041, 77.1025),
        }
    }

    async fn ledger_with(sink: Arc<InMemorySink>) -> OfferLedger {
        OfferLedger::open(sink, Duration::from_secs(1)).await.unwrap()
    }

    /// Sink whose flush blocks longer than any test timeout.
    struct StalledSink;

    impl OfferSink for StalledSink {
        fn flush(&self, _offers: &[SellerOffer]) -> Result<(), PersistenceError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        }

        fn load(&self) -> Result<Vec<SellerOffer>, PersistenceError> {
            Ok(Vec::new())
        }

        fn backend_name(&self) -> &'static str {
            "Stalled"
        }
    }

    /// Sink whose first flush is slow. Records whether two flushes ever
    /// overlapped.
    struct SlowFirstSink {
        first_delay: Duration,
        flushes: AtomicUsize,
        in_flight: AtomicBool,
        overlapped: AtomicBool,
        stored: std::sync::RwLock<Vec<SellerOffer>>,
    }

    impl SlowFirstSink {
        fn new(first_delay: Duration) -> Self {
            Self {
                first_delay,
                flushes: AtomicUsize::new(0),
                in_flight: AtomicBool::new(false),
                overlapped: AtomicBool::new(false),
                stored: std::sync::RwLock::new(Vec::new()),
            }
        }

        fn stored_waste_types(&self) -> Vec<String> {
            self.stored.read().unwrap().iter().map(|o| o.waste_type.clone()).collect()
        }
    }

    impl OfferSink for SlowFirstSink {
        fn flush(&self, offers: &[SellerOffer]) -> Result<(), PersistenceError> {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            if self.flushes.fetch_add(1, Ordering::SeqCst) == 0 {
                std::thread::sleep(self.first_delay);
            }
            *self.stored.write().unwrap() = offers.to_vec();
            self.in_flight.store(false, Ordering::SeqCst);
            Ok(())
        }

        fn load(&self) -> Result<Vec<SellerOffer>, PersistenceError> {
            Ok(self.stored.read().unwrap().clone())
        }

        fn backend_name(&self) -> &'static str {
            "SlowFirst"
        }
    }

    fn waste_types(offers: &[SellerOffer]) -> Vec<String> {
        offers.iter().map(|o| o.waste_type.clone()).collect()
    }

    #[tokio::test]
    async fn test_append_visible_after_return() {
        let sink = Arc::new(InMemorySink::new());
        let ledger = ledger_with(Arc::clone(&sink)).await;

        let listed = ledger.append(new_offer("Banana")).await.unwrap();
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0], listed);
        assert!(listed.is_available);
        assert!(listed.offer_id.starts_with("O-000001-"));
        assert_eq!(sink.stored().unwrap(), *snapshot);
    }

    #[tokio::test]
    async fn test_failed_flush_leaves_ledger_unchanged() {
        let sink = Arc::new(InMemorySink::new());
        let ledger = ledger_with(Arc::clone(&sink)).await;
        ledger.append(new_offer("Banana")).await.unwrap();

        sink.set_failing(true);
        let err = ledger.append(new_offer("Bone")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(_)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(sink.stored().unwrap().len(), 1);

        sink.set_failing(false);
        let listed = ledger.append(new_offer("Fish")).await.unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(listed.sequence, 3);
    }

    #[tokio::test]
    async fn test_flush_timeout_leaves_ledger_unchanged() {
        let ledger = OfferLedger::open(Arc::new(StalledSink), Duration::from_millis(20))
            .await
            .unwrap();
        let err = ledger.append(new_offer("Banana")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Timeout(_)));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_flush_never_overwrites_a_later_one() {
        let sink = Arc::new(SlowFirstSink::new(Duration::from_millis(300)));
        let ledger = OfferLedger::open(sink.clone(), Duration::from_millis(200))
            .await
            .unwrap();

        let err = ledger.append(new_offer("Rejected")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Timeout(_)));

        let confirmed = ledger.append(new_offer("Confirmed")).await.unwrap();
        assert_eq!(confirmed.sequence, 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(waste_types(&ledger.snapshot()), vec!["Confirmed"]);
        assert_eq!(sink.stored_waste_types(), vec!["Confirmed"]);
        assert_eq!(sink.load().unwrap(), *ledger.snapshot());
        assert!(!sink.overlapped.load(Ordering::SeqCst), "flushes ran concurrently");
    }

    #[tokio::test]
    async fn test_append_refused_while_previous_flush_runs() {
        let sink = Arc::new(SlowFirstSink::new(Duration::from_millis(300)));
        let ledger = OfferLedger::open(sink.clone(), Duration::from_millis(30))
            .await
            .unwrap();

        assert!(ledger.append(new_offer("Rejected")).await.is_err());
        let err = ledger.append(new_offer("Early")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Timeout(_)));
        assert!(ledger.is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        let listed = ledger.append(new_offer("Confirmed")).await.unwrap();
        // The refused append never got a sequence number
        assert_eq!(listed.sequence, 2);
        assert_eq!(sink.stored_waste_types(), vec!["Confirmed"]);
        assert!(!sink.overlapped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_non_finite_offer_is_refused() {
        let sink = Arc::new(InMemorySink::new());
        let ledger = ledger_with(Arc::clone(&sink)).await;

        let mut huge = new_offer("Meat");
        huge.npk_score = NpkVector::new(f64::INFINITY, 1.0, 1.0);
        let err = ledger.append(huge).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Serialization(_)));
        assert!(ledger.is_empty());
        assert!(sink.stored().unwrap().is_empty());

        let listed = ledger.append(new_offer("Banana")).await.unwrap();
        assert_eq!(listed.sequence, 1);
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_appends() {
        let ledger = ledger_with(Arc::new(InMemorySink::new())).await;
        ledger.append(new_offer("Banana")).await.unwrap();

        let before = ledger.snapshot();
        ledger.append(new_offer("Bone")).await.unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(ledger.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_restore_resumes_sequence() {
        let sink = Arc::new(InMemorySink::with_offers(vec![offer(7, "Bone"), offer(3, "Banana")]));
        let ledger = ledger_with(sink).await;

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.iter().map(|o| o.sequence).collect::<Vec<_>>(), vec![3, 7]);

        let listed = ledger.append(new_offer("Fish")).await.unwrap();
        assert_eq!(listed.sequence, 8);
        assert!(listed.offer_id.starts_with("O-000008-"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_serialized() {
        let ledger = Arc::new(ledger_with(Arc::new(InMemorySink::new())).await);

        let mut handles = Vec::new();
        for i in 0..16 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                let waste = if i % 2 == 0 { "Banana" } else { "Bone" };
                ledger.append(new_offer(waste)).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.len(), 16);
        let sequences: Vec<u64> = snapshot.iter().map(|o| o.sequence).collect();
        assert_eq!(sequences, (1..=16).collect::<Vec<_>>());

        let mut ids: Vec<&str> = snapshot.iter().map(|o| o.offer_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 16);
    }
}
