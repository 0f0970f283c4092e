//! Single-file JSON offer store.
//!
//! The whole collection is written to `<file>.tmp`, synced and renamed over
//! the previous file, so a crash mid-flush leaves the old collection intact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::persistence::{OfferSink, PersistenceError};
use crate::types::SellerOffer;

pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Store offers in `path`. The parent directory is created if missing.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OfferSink for JsonFileSink {
    fn flush(&self, offers: &[SellerOffer]) -> Result<(), PersistenceError> {
        let bytes = serde_json::to_vec_pretty(offers)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<SellerOffer>, PersistenceError> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let mut offers: Vec<SellerOffer> = serde_json::from_slice(&bytes)?;
                offers.sort_by_key(|o| o.sequence);
                Ok(offers)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn backend_name(&self) -> &'static str {
        "JsonFile"
    }
}
