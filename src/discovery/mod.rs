//! One discovery pass over a product gallery, then content-deduplicated storage

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::canonical::signature;
use crate::error::{HarvestError, Result};
use crate::ledger::ContentLedger;
use crate::models::{DownloadRecord, ResourceHandle};
use crate::navigator::{CarouselNavigator, NavigatorConfig};
use crate::traits::{CarouselSession, Fetcher, Storage};

/// Signatures accepted during one discovery pass
#[derive(Debug, Default)]
pub struct SeenSignatures {
    signatures: HashSet<String>,
}

impl SeenSignatures {
    /// Accept a URL whose signature has not been seen yet
    pub fn admit(&mut self, raw_url: &str) -> Option<ResourceHandle> {
        if self.signatures.contains(&signature(raw_url)) {
            return None;
        }

        let handle = ResourceHandle::new(raw_url);
        self.signatures.insert(handle.signature().to_string());
        Some(handle)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Discover every distinct image of a carousel.
///
/// Walks the carousel, then sweeps the static thumbnail list for anything the
/// walk missed. The session is closed before returning, whatever the outcome.
///
/// # Errors
/// * `HarvestError::ZeroResults` - nothing was found at all
pub async fn discover_images<S: CarouselSession>(
    mut session: S,
    config: &NavigatorConfig,
) -> Result<Vec<ResourceHandle>> {
    let discovered = collect_handles(&mut session, config).await;
    session.close().await;

    if discovered.is_empty() {
        return Err(HarvestError::ZeroResults);
    }

    info!("Total unique images found: {}", discovered.len());
    Ok(discovered)
}

async fn collect_handles<S: CarouselSession + ?Sized>(
    session: &mut S,
    config: &NavigatorConfig,
) -> Vec<ResourceHandle> {
    let mut seen = SeenSignatures::default();

    let outcome = CarouselNavigator::new(session, config)
        .walk(|raw_url| seen.admit(raw_url))
        .await;
    let mut discovered = outcome.state.discovered;
    info!(
        "Carousel walk found {} images in {} steps ({:?})",
        discovered.len(),
        outcome.state.steps_taken,
        outcome.stop
    );

    let thumbnails = session.thumbnail_urls().await;
    info!("Checking {} thumbnail images...", thumbnails.len());

    for thumbnail in thumbnails {
        if !session.accepts_frame(&thumbnail) {
            continue;
        }
        if let Some(handle) = seen.admit(&thumbnail) {
            info!("Extracted from thumbnail: {}", handle.canonical_url());
            discovered.push(handle);
        }
    }

    discovered
}

/// Download every handle's canonical URL and store each distinct content once.
///
/// Downloads run concurrently, at most `concurrency` at a time. A failed
/// download or save is logged and skipped. Records come back in the order
/// their names were assigned.
pub async fn dedupe_and_store(
    handles: &[ResourceHandle],
    fetcher: &dyn Fetcher,
    storage: Arc<dyn Storage>,
    concurrency: usize,
) -> Vec<DownloadRecord> {
    let ledger = ContentLedger::new(storage);
    let total = handles.len();

    stream::iter(handles.iter().enumerate())
        .for_each_concurrent(concurrency.max(1), |(idx, handle)| {
            let ledger = &ledger;
            async move {
                let url = handle.canonical_url();
                info!("Downloading image {}/{}: {}", idx + 1, total, url);

                let resource = match fetcher.fetch(url).await {
                    Ok(resource) => resource,
                    Err(e) => {
                        warn!("Error downloading image {}: {}", url, e);
                        return;
                    }
                };

                let extension = detect_extension(resource.content_type.as_deref(), url);
                match ledger.register(&resource.bytes, extension).await {
                    Ok((true, existing)) => {
                        info!("Skipping duplicate image (same content as {})", existing.stored_name);
                    }
                    Ok((false, record)) => info!("Saved as: {}", record.stored_name),
                    Err(e) => warn!("Error storing image {}: {}", url, e),
                }
            }
        })
        .await;

    ledger.records().await
}

/// File extension for an image, from its content type first, then its URL
pub fn detect_extension(content_type: Option<&str>, url: &str) -> &'static str {
    let content_type = content_type.unwrap_or_default().to_lowercase();
    let url = url.to_lowercase();

    const KNOWN: [&str; 3] = ["png", "webp", "gif"];

    KNOWN
        .into_iter()
        .find(|ext| content_type.contains(ext))
        .or_else(|| KNOWN.into_iter().find(|ext| url.contains(ext)))
        .unwrap_or("jpg")
}
