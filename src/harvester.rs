use std::sync::{Arc, LazyLock};

use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use tracing::{error, info};

use crate::config::HarvestConfig;
use crate::discovery::{dedupe_and_store, discover_images};
use crate::models::ProductManifest;
use crate::scraper::HttpClient;
use crate::storage::{DirectoryStorage, write_json};
use crate::traits::GalleryScraper;

static PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"products?[_/](\d+)").expect("valid product id pattern"));

#[derive(Clone)]
pub struct ImageHarvester<S> {
    scraper: S,
    http: HttpClient,
    config: HarvestConfig,
}

impl<S: GalleryScraper> ImageHarvester<S> {
    pub fn new(scraper: S, http: HttpClient, config: HarvestConfig) -> Self {
        Self {
            scraper,
            http,
            config,
        }
    }

    /// Discover, download and record every image of one product page
    pub async fn harvest_product(&self, product_url: &str) -> Result<ProductManifest> {
        info!(
            "Scraping product from: {} ({})",
            product_url,
            self.scraper.config().name
        );

        let session = self
            .scraper
            .open_session(product_url)
            .await
            .with_context(|| format!("Failed to open gallery on {product_url}"))?;

        let handles = discover_images(session, &self.config.navigator)
            .await
            .with_context(|| format!("Failed to discover images on {product_url}"))?;
        info!("Found {} distinct image URLs", handles.len());

        let product_id = product_id(product_url);
        let folder = self.config.output_dir.join(&product_id);
        let storage = Arc::new(DirectoryStorage::new(&folder));

        let records = dedupe_and_store(
            &handles,
            &self.http,
            storage,
            self.config.download_concurrency,
        )
        .await;

        let manifest = ProductManifest {
            product_url: product_url.to_string(),
            product_id: product_id.clone(),
            images_folder: folder.display().to_string(),
            image_urls: handles.iter().map(|h| h.canonical_url().to_string()).collect(),
            total_images: handles.len(),
            actual_images_saved: records.len(),
            downloaded_images: records,
            harvested_at: Utc::now(),
        };

        let manifest_path = self.config.output_dir.join(format!("{product_id}.json"));
        write_json(&manifest_path, &manifest).await?;

        info!(
            "Distinct images downloaded for {}: {}",
            product_id, manifest.actual_images_saved
        );
        Ok(manifest)
    }

    /// Harvest several products in turn, pausing between them.
    ///
    /// A product that fails is logged and skipped.
    pub async fn harvest_all(&self, product_urls: &[String]) -> Vec<ProductManifest> {
        let mut manifests = Vec::new();

        for (i, url) in product_urls.iter().enumerate() {
            info!("Processing product {}/{}", i + 1, product_urls.len());

            match self.harvest_product(url).await {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => error!("Error harvesting {}: {:#}", url, e),
            }

            // Be polite with rate limiting
            if i + 1 < product_urls.len() {
                tokio::time::sleep(self.config.request_delay).await;
            }
        }

        info!(
            "Harvest complete: {}/{} products",
            manifests.len(),
            product_urls.len()
        );
        manifests
    }
}

/// Folder name for a product: its numeric id when the URL carries one,
/// otherwise a hash of the URL
pub fn product_id(product_url: &str) -> String {
    PRODUCT_ID
        .captures(product_url)
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| format!("{:x}", md5::compute(product_url)))
}
