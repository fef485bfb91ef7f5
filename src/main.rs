use anyhow::{Result, bail};
use tracing::info;
use tracing_subscriber::EnvFilter;

use image_harvester::config::HarvestConfig;
use image_harvester::harvester::ImageHarvester;
use image_harvester::scraper::HttpClient;
use image_harvester::scrapers::odp::OdpScraper;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting product image harvester");

    let config = HarvestConfig::from_env();

    // Command line URLs win over HARVEST_PRODUCT_URLS
    let args: Vec<String> = std::env::args().skip(1).collect();
    let product_urls = if args.is_empty() {
        config.product_urls.clone()
    } else {
        args
    };

    if product_urls.is_empty() {
        bail!("No product URLs given - pass them as arguments or set HARVEST_PRODUCT_URLS");
    }

    let http = HttpClient::new(config.request_timeout, config.render.clone())?;
    let harvester = ImageHarvester::new(OdpScraper::new(http.clone()), http, config);

    let manifests = harvester.harvest_all(&product_urls).await;
    for manifest in &manifests {
        info!(
            "{}: {} distinct URLs, {} images saved to {}",
            manifest.product_id,
            manifest.total_images,
            manifest.actual_images_saved,
            manifest.images_folder
        );
    }

    if manifests.is_empty() {
        bail!("No product could be harvested");
    }

    Ok(())
}
