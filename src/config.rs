//! # Runtime Configuration
//!
//! All settings come from environment variables (a `.env` file is loaded by
//! `main` through `dotenvy`). Every variable is optional; anything missing or
//! unparsable falls back to its default with a warning.
//!
//! ## Variables
//!
//! - `HARVEST_PRODUCT_URLS`: comma-separated product pages, used when no URL is
//!   given on the command line
//! - `HARVEST_OUTPUT_DIR`: image root, one folder per product (`product_images`)
//! - `LOOP_THRESHOLD`: consecutive repeats that mean the carousel looped (3)
//! - `STEP_SAFETY_MARGIN`: steps allowed beyond the estimated gallery size (5)
//! - `DEFAULT_ESTIMATED_TOTAL`: gallery size assumed without a thumbnail count (10)
//! - `STEP_TIMEOUT_MS`: bound for one advance or frame read (5000)
//! - `DOWNLOAD_CONCURRENCY`: parallel image downloads (4)
//! - `REQUEST_TIMEOUT_MS`: HTTP request timeout (30000)
//! - `REQUEST_DELAY_MS`: pause between two products (2000)
//! - `BROWSERLESS_URL` / `BROWSERLESS_TOKEN`: render pages through a
//!   Browserless `/content` endpoint instead of fetching them directly

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::navigator::{
    DEFAULT_ESTIMATED_TOTAL, DEFAULT_LOOP_THRESHOLD, DEFAULT_SAFETY_MARGIN, NavigatorConfig,
};
use crate::scraper::RenderEndpoint;

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub product_urls: Vec<String>,
    pub output_dir: PathBuf,
    pub navigator: NavigatorConfig,
    pub download_concurrency: usize,
    pub request_timeout: Duration,
    pub request_delay: Duration,
    pub render: Option<RenderEndpoint>,
}

impl HarvestConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let product_urls = lookup("HARVEST_PRODUCT_URLS")
            .map(|urls| {
                urls.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let navigator = NavigatorConfig {
            loop_threshold: parse_or(&lookup, "LOOP_THRESHOLD", DEFAULT_LOOP_THRESHOLD).max(1),
            safety_margin: parse_or(&lookup, "STEP_SAFETY_MARGIN", DEFAULT_SAFETY_MARGIN),
            default_estimated_total: parse_or(&lookup, "DEFAULT_ESTIMATED_TOTAL", DEFAULT_ESTIMATED_TOTAL),
            step_timeout: Duration::from_millis(parse_or(&lookup, "STEP_TIMEOUT_MS", 5_000)),
            deadline: None,
        };

        let render = lookup("BROWSERLESS_URL").map(|base_url| RenderEndpoint {
            base_url,
            token: lookup("BROWSERLESS_TOKEN"),
        });

        Self {
            product_urls,
            output_dir: lookup("HARVEST_OUTPUT_DIR")
                .map_or_else(|| PathBuf::from("product_images"), PathBuf::from),
            navigator,
            download_concurrency: parse_or(&lookup, "DOWNLOAD_CONCURRENCY", 4).max(1),
            request_timeout: Duration::from_millis(parse_or(&lookup, "REQUEST_TIMEOUT_MS", 30_000)),
            request_delay: Duration::from_millis(parse_or(&lookup, "REQUEST_DELAY_MS", 2_000)),
            render,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value {:?} for {} - using default", raw, key);
            default
        }),
        None => default,
    }
}
