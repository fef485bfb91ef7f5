//! Traits and interfaces for site-agnostic image harvesting

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{FrameReadError, Result};

/// Configuration for a site's image gallery
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Display name for the website
    pub name: String,
    /// Base URL used to resolve relative image sources
    pub base_url: String,
    /// CSS selectors for the gallery widget
    pub selectors: GallerySelectors,
    /// Substring a frame URL must contain to count as a product image
    pub frame_marker: Option<String>,
}

/// CSS selectors for the parts of an image carousel
#[derive(Debug, Clone)]
pub struct GallerySelectors {
    /// Image inside every carousel slide
    pub slide_image: String,
    /// Image inside the slide currently shown
    pub active_slide_image: String,
    /// The "next image" control
    pub next_control: String,
    /// Thumbnail entries, counted to estimate the gallery size
    pub thumbnail: String,
    /// Image inside a thumbnail entry
    pub thumbnail_image: String,
}

/// Outcome of asking a carousel to move to its next frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// A new frame is showing
    Moved,
    /// No next control; the carousel has nothing more to show
    NoMore,
    /// Navigation broke in an unexpected way
    Failed(String),
}

/// A live cursor over one product's image carousel.
///
/// A session is a single mutable cursor: a frame read is only meaningful
/// right after the preceding [`advance`](CarouselSession::advance), which is
/// why every method takes `&mut self`.
#[async_trait]
pub trait CarouselSession: Send {
    /// URL of the frame currently shown, `None` when there is no frame element
    async fn current_frame_url(&mut self) -> std::result::Result<Option<String>, FrameReadError>;

    /// Move to the next frame
    async fn advance(&mut self) -> Advance;

    /// Statically available thumbnail URLs, possibly empty
    async fn thumbnail_urls(&mut self) -> Vec<String>;

    /// Number of thumbnails, used to bound navigation
    async fn thumbnail_count_hint(&mut self) -> Option<usize> {
        None
    }

    /// Whether a frame URL points at a product image at all
    fn accepts_frame(&self, _url: &str) -> bool {
        true
    }

    /// Release the underlying session
    async fn close(&mut self) {}
}

/// Bytes of a fetched resource
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Fetches the bytes behind a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedResource>;
}

/// Persists named blobs
#[async_trait]
pub trait Storage: Send + Sync {
    /// Save `bytes` under `name` and return where they ended up
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Trait for website-specific gallery scrapers
#[async_trait]
pub trait GalleryScraper: Send + Sync {
    type Session: CarouselSession;

    /// Get the configuration for this scraper
    fn config(&self) -> &ScraperConfig;

    /// Open a carousel session on a product page
    ///
    /// # Arguments
    /// * `product_url` - The product page to load
    ///
    /// # Returns
    /// * `Result<Self::Session>` - A session positioned on the first frame
    async fn open_session(&self, product_url: &str) -> Result<Self::Session>;
}

/// Turn a relative or protocol-relative image source into an absolute URL
pub(crate) fn resolve_against(base_url: &str, src: &str) -> String {
    if src.starts_with("http") {
        src.to_string()
    } else if src.starts_with("//") {
        format!("https:{src}")
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), src.trim_start_matches('/'))
    }
}
