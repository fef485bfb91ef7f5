//! ODP Business / Office Depot product gallery

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;
use crate::scraper::HttpClient;
use crate::scrapers::gallery::HtmlCarouselSession;
use crate::traits::{GalleryScraper, GallerySelectors, ScraperConfig};

/// Gallery configuration for odpbusiness.com product pages
pub fn odp_config() -> ScraperConfig {
    ScraperConfig {
        name: "ODP Business".to_string(),
        base_url: "https://www.odpbusiness.com".to_string(),
        selectors: GallerySelectors {
            slide_image: ".image-gallery-slide img".to_string(),
            active_slide_image: ".image-gallery-slide.center img".to_string(),
            next_control: r#"[data-auid*="ImageGalleryScrollRightIcon"]"#.to_string(),
            thumbnail: ".image-gallery-thumbnails-container .image-gallery-thumbnail".to_string(),
            thumbnail_image: ".image-gallery-thumbnail img".to_string(),
        },
        frame_marker: Some("products".to_string()),
    }
}

/// Scraper implementation for odpbusiness.com
#[derive(Clone)]
pub struct OdpScraper {
    http: HttpClient,
    config: ScraperConfig,
}

impl OdpScraper {
    /// Create a new ODP scraper with default configuration
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            config: odp_config(),
        }
    }
}

#[async_trait]
impl GalleryScraper for OdpScraper {
    type Session = HtmlCarouselSession;

    fn config(&self) -> &ScraperConfig {
        &self.config
    }

    async fn open_session(&self, product_url: &str) -> Result<Self::Session> {
        let html = self.http.fetch_page(product_url).await?;
        let session = HtmlCarouselSession::parse(&html, &self.config)?;

        info!(
            "Found approximately {} images in {} gallery",
            session.slide_count(),
            self.config.name
        );
        Ok(session)
    }
}
