//! Error types shared by the harvesting pipeline

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error (status {status}) for {url}")]
    Status { status: u16, url: String },

    #[error("Failed to write {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    /// Discovery finished without a single image. A product page is expected
    /// to have at least one, so this points at a changed page layout.
    #[error("No images discovered")]
    ZeroResults,
}

/// Failure to read the frame currently shown by a carousel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameReadError {
    /// The element went away under us (stale reference, mid-transition).
    /// Worth one immediate retry.
    #[error("transient frame read failure: {0}")]
    Transient(String),
}
