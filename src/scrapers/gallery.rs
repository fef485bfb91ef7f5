//! Carousel session over a gallery parsed from page HTML
//!
//! The page is parsed once; the session then moves a cursor over the slides it
//! found. Like the live widget, advancing past the last slide wraps around to
//! the first, so callers must detect the loop themselves.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::{FrameReadError, HarvestError, Result};
use crate::traits::{Advance, CarouselSession, ScraperConfig, resolve_against};

#[derive(Debug, Clone)]
pub struct HtmlCarouselSession {
    slides: Vec<String>,
    position: usize,
    has_next_control: bool,
    thumbnails: Vec<String>,
    thumbnail_count: usize,
    frame_marker: Option<String>,
}

impl HtmlCarouselSession {
    /// Parse the gallery widget of a product page
    pub fn parse(html: &str, config: &ScraperConfig) -> Result<Self> {
        let selectors = &config.selectors;
        let slide_selector = parse_selector(&selectors.slide_image)?;
        let active_selector = parse_selector(&selectors.active_slide_image)?;
        let next_selector = parse_selector(&selectors.next_control)?;
        let thumbnail_selector = parse_selector(&selectors.thumbnail)?;
        let thumbnail_image_selector = parse_selector(&selectors.thumbnail_image)?;

        let document = Html::parse_document(html);
        let image_url = |img: ElementRef| {
            // Try data-src first (for lazy loading), then src
            img.value()
                .attr("data-src")
                .or_else(|| img.value().attr("src"))
                .map(|src| resolve_against(&config.base_url, src))
        };

        let mut slides: Vec<String> = document.select(&slide_selector).filter_map(image_url).collect();
        let active = document.select(&active_selector).next().and_then(image_url);

        let position = match active {
            Some(active) => match slides.iter().position(|slide| *slide == active) {
                Some(position) => position,
                None => {
                    slides.insert(0, active);
                    0
                }
            },
            None => 0,
        };

        let thumbnails = document
            .select(&thumbnail_image_selector)
            .filter_map(image_url)
            .collect();

        Ok(Self {
            slides,
            position,
            has_next_control: document.select(&next_selector).next().is_some(),
            thumbnails,
            thumbnail_count: document.select(&thumbnail_selector).count(),
            frame_marker: config.frame_marker.clone(),
        })
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{e:?}"),
    })
}

#[async_trait]
impl CarouselSession for HtmlCarouselSession {
    async fn current_frame_url(&mut self) -> std::result::Result<Option<String>, FrameReadError> {
        Ok(self.slides.get(self.position).cloned())
    }

    async fn advance(&mut self) -> Advance {
        if !self.has_next_control || self.slides.is_empty() {
            return Advance::NoMore;
        }

        self.position = (self.position + 1) % self.slides.len();
        Advance::Moved
    }

    async fn thumbnail_urls(&mut self) -> Vec<String> {
        self.thumbnails.clone()
    }

    async fn thumbnail_count_hint(&mut self) -> Option<usize> {
        (self.thumbnail_count > 0).then_some(self.thumbnail_count)
    }

    fn accepts_frame(&self, url: &str) -> bool {
        self.frame_marker.as_deref().is_none_or(|marker| url.contains(marker))
    }

    async fn close(&mut self) {
        debug!("Closing gallery session ({} slides)", self.slides.len());
        self.slides.clear();
        self.thumbnails.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::odp::odp_config;

    const PAGE: &str = r#"
        <div class="image-gallery">
          <div class="image-gallery-slide left"><img src="//media.officedepot.com/products/4852038/4852038_o03_072821/4852038"></div>
          <div class="image-gallery-slide center"><img src="//media.officedepot.com/products/4852038/4852038_o01_072821/4852038?w=450"></div>
          <div class="image-gallery-slide right"><img data-src="/products/4852038/4852038_o02_072821/4852038" src="placeholder.gif"></div>
          <button data-auid="ImageGalleryScrollRightIcon_Button">next</button>
          <div class="image-gallery-thumbnails-container">
            <a class="image-gallery-thumbnail"><img src="https://media.officedepot.com/products/4852038/4852038_p01_072821/4852038"></a>
            <a class="image-gallery-thumbnail"><img src="https://media.officedepot.com/products/4852038/4852038_p04_072821/4852038"></a>
          </div>
        </div>"#;

    #[tokio::test]
    async fn session_starts_on_the_centered_slide() {
        let mut session = HtmlCarouselSession::parse(PAGE, &odp_config()).unwrap();

        assert_eq!(session.slide_count(), 3);
        assert_eq!(
            session.current_frame_url().await.unwrap().as_deref(),
            Some("https://media.officedepot.com/products/4852038/4852038_o01_072821/4852038?w=450")
        );
        assert_eq!(session.thumbnail_count_hint().await, Some(2));
    }

    #[tokio::test]
    async fn advancing_wraps_around() {
        let mut session = HtmlCarouselSession::parse(PAGE, &odp_config()).unwrap();

        assert_eq!(session.advance().await, Advance::Moved);
        assert_eq!(
            session.current_frame_url().await.unwrap().as_deref(),
            Some("https://www.odpbusiness.com/products/4852038/4852038_o02_072821/4852038")
        );
        session.advance().await;
        assert!(session.current_frame_url().await.unwrap().unwrap().contains("_o03_"));
        session.advance().await;
        assert!(session.current_frame_url().await.unwrap().unwrap().contains("_o01_"));
    }

    #[tokio::test]
    async fn missing_next_control_means_no_more() {
        let page = PAGE.replace("ImageGalleryScrollRightIcon", "Other");
        let mut session = HtmlCarouselSession::parse(&page, &odp_config()).unwrap();
        assert_eq!(session.advance().await, Advance::NoMore);
    }

    #[tokio::test]
    async fn empty_page_has_no_frame() {
        let mut session = HtmlCarouselSession::parse("<html></html>", &odp_config()).unwrap();
        assert_eq!(session.current_frame_url().await.unwrap(), None);
        assert_eq!(session.thumbnail_count_hint().await, None);
        assert!(session.thumbnail_urls().await.is_empty());
    }

    #[test]
    fn frame_marker_filters_non_product_images() {
        let session = HtmlCarouselSession::parse("<html></html>", &odp_config()).unwrap();
        assert!(session.accepts_frame("https://media.officedepot.com/products/1/1_o01_/1"));
        assert!(!session.accepts_frame("https://media.officedepot.com/banners/sale.png"));
    }
}
