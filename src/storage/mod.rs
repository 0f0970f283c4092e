//! Offer storage
//!
//! The in-process [`OfferLedger`] fronts one durable [`OfferSink`]:
//! - `sled` (default): `<data_dir>/offers.db`
//! - `json`: `<data_dir>/offers.json`
//! - `memory`: nothing survives a restart

pub mod json_sink;
pub mod ledger;
pub mod persistence;
pub mod sled_sink;

pub use json_sink::JsonFileSink;
pub use ledger::OfferLedger;
pub use persistence::{InMemorySink, OfferSink, PersistenceError};
pub use sled_sink::SledOfferSink;

use std::path::Path;
use std::sync::Arc;

use crate::config::StorageBackend;

/// Sled database directory under the data dir.
pub const SLED_DB_NAME: &str = "offers.db";

/// JSON store file name under the data dir.
pub const JSON_FILE_NAME: &str = "offers.json";

/// Open the configured sink under `data_dir`.
pub fn open_sink(
    backend: StorageBackend,
    data_dir: &Path,
) -> Result<Arc<dyn OfferSink>, PersistenceError> {
    let sink: Arc<dyn OfferSink> = match backend {
        StorageBackend::Sled => {
            std::fs::create_dir_all(data_dir)?;
            Arc::new(SledOfferSink::open(data_dir.join(SLED_DB_NAME))?)
        }
        StorageBackend::Json => Arc::new(JsonFileSink::new(data_dir.join(JSON_FILE_NAME))?),
        StorageBackend::Memory => Arc::new(InMemorySink::new()),
    };
    Ok(sink)
}
