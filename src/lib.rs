//! Product image harvesting: walk an image carousel, keep one URL per distinct
//! image, download each distinct picture once.

pub mod canonical;
pub mod config;
pub mod discovery;
pub mod error;
pub mod harvester;
pub mod ledger;
pub mod models;
pub mod navigator;
pub mod scraper;
pub mod scrapers;
pub mod storage;
pub mod traits;
