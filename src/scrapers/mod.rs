//! Site-specific gallery scrapers

pub mod gallery;
pub mod odp;
