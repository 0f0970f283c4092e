//! Sled-backed offer store.
//!
//! Key: offer sequence as u64 big-endian bytes (sorts in creation order)
//! Value: JSON-serialized SellerOffer
//!
//! Each flush applies one atomic batch and then calls `flush()` so an offer
//! is only reported stored once it is on disk.

use std::collections::HashSet;
use std::path::Path;

use super::persistence::{OfferSink, PersistenceError};
use crate::types::SellerOffer;

const OFFERS_TREE: &str = "offers";

#[derive(Clone)]
pub struct SledOfferSink {
    db: sled::Db,
    offers: sled::Tree,
}

impl SledOfferSink {
    /// Open or create the offer database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let offers = db.open_tree(OFFERS_TREE)?;

        let sink = Self { db, offers };
        tracing::info!(
            path = %path.display(),
            stored = sink.offers.len(),
            size_bytes = sink.size_bytes(),
            "Offer store opened"
        );
        Ok(sink)
    }

    /// Get database size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }
}

impl OfferSink for SledOfferSink {
    fn flush(&self, offers: &[SellerOffer]) -> Result<(), PersistenceError> {
        let mut batch = sled::Batch::default();
        let mut keep = HashSet::with_capacity(offers.len());

        for offer in offers {
            let key = offer.sequence.to_be_bytes();
            batch.insert(key.to_vec(), serde_json::to_vec(offer)?);
            keep.insert(key);
        }

        for item in self.offers.iter().keys() {
            let key = item?;
            let stale = <[u8; 8]>::try_from(key.as_ref()).map_or(true, |k| !keep.contains(&k));
            if stale {
                batch.remove(key);
            }
        }

        self.offers.apply_batch(batch)?;
        self.db.flush()?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<SellerOffer>, PersistenceError> {
        let mut offers = Vec::with_capacity(self.offers.len());
        for item in self.offers.iter() {
            let (_key, value) = item?;
            offers.push(serde_json::from_slice::<SellerOffer>(&value)?);
        }
        Ok(offers)
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
