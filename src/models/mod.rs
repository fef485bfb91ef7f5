//! Data models for discovered images, stored downloads and product manifests

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::canonical::{canonicalize, signature};

/// One image surfaced by a carousel frame or a gallery thumbnail.
///
/// `signature` and `canonical_url` are derived from `raw_url` at construction
/// and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceHandle {
    raw_url: String,
    signature: String,
    canonical_url: String,
}

impl ResourceHandle {
    pub fn new(raw_url: impl Into<String>) -> Self {
        let raw_url = raw_url.into();
        let signature = signature(&raw_url);
        let canonical_url = canonicalize(&raw_url);

        Self {
            raw_url,
            signature,
            canonical_url,
        }
    }

    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }
}

/// An image persisted by the content ledger, one per distinct content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRecord {
    #[serde(serialize_with = "serialize_hex")]
    pub content_hash: [u8; 16],
    pub stored_name: String,
    pub extension: String,
}

impl DownloadRecord {
    pub fn hash_hex(&self) -> String {
        format!("{:x}", md5::Digest(self.content_hash))
    }
}

fn serialize_hex<S: Serializer>(hash: &[u8; 16], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:x}", md5::Digest(*hash)))
}

/// Bookkeeping for a single carousel walk
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    pub consecutive_duplicates: u32,
    pub steps_taken: usize,
    pub discovered: Vec<ResourceHandle>,
}

/// Summary written next to the images of one product
#[derive(Debug, Serialize)]
pub struct ProductManifest {
    pub product_url: String,
    pub product_id: String,
    pub images_folder: String,
    pub image_urls: Vec<String>,
    pub total_images: usize,
    pub downloaded_images: Vec<DownloadRecord>,
    pub actual_images_saved: usize,
    pub harvested_at: DateTime<Utc>,
}
