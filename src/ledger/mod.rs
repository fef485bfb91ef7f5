//! Byte-level deduplication of downloaded images
//!
//! Signatures catch most duplicates before any download, but two different
//! URLs can still serve identical bytes. The ledger hashes every download and
//! stores each distinct content once, under a sequential name.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;
use crate::models::DownloadRecord;
use crate::traits::Storage;

pub struct ContentLedger {
    storage: Arc<dyn Storage>,
    // Held across the save so names stay dense and each hash is written once.
    entries: Mutex<Entries>,
}

/// Records in registration order, indexed by content hash
#[derive(Default)]
struct Entries {
    records: Vec<DownloadRecord>,
    by_hash: HashMap<[u8; 16], usize>,
}

impl ContentLedger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Register downloaded bytes.
    ///
    /// Returns `(true, existing)` when the same content was registered before,
    /// without touching storage. Otherwise saves the bytes as `image_NN.<ext>`
    /// and returns `(false, new_record)`. A failed save leaves the ledger as it
    /// was.
    pub async fn register(&self, bytes: &[u8], extension: &str) -> Result<(bool, DownloadRecord)> {
        let content_hash = md5::compute(bytes).0;

        let mut entries = self.entries.lock().await;
        if let Some(&index) = entries.by_hash.get(&content_hash) {
            let existing = &entries.records[index];
            debug!("Content already stored as {}", existing.stored_name);
            return Ok((true, existing.clone()));
        }

        let stored_name = format!("image_{:02}.{}", entries.records.len() + 1, extension);
        self.storage.save(&stored_name, bytes).await?;

        let record = DownloadRecord {
            content_hash,
            stored_name,
            extension: extension.to_string(),
        };
        let index = entries.records.len();
        entries.records.push(record.clone());
        entries.by_hash.insert(content_hash, index);

        Ok((false, record))
    }

    /// All records in registration order, which is also sequence-number order
    pub async fn records(&self) -> Vec<DownloadRecord> {
        self.entries.lock().await.records.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.records.is_empty()
    }
}
