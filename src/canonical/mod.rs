//! URL identity and quality rewriting for gallery images
//!
//! Product galleries serve one picture under many URLs: different size tokens
//! (`h_450`, `h_1000`), preview versus original renditions (`_p03_` versus
//! `_o03_`) and arbitrary query strings. Two pure functions live here:
//!
//! - [`signature`] derives a cheap identity token so duplicates can be dropped
//!   before anything is fetched.
//! - [`canonicalize`] rewrites a URL to its best-quality rendition.
//!
//! Both are total: they never fail and accept any string.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Height every smaller `h_<digits>` size token is raised to
pub const MAX_SIZE: u64 = 1000;

/// Path segments that carry no identity of their own
const STRUCTURAL_SEGMENTS: &[&str] = &["products"];

static VARIANT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[op]\d+_").expect("valid variant token pattern"));

static PREVIEW_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_p\d+_").expect("valid preview marker pattern"));

// The leading group keeps `width_450` and friends from being read as a size token.
static SIZE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<lead>^|[^A-Za-z0-9])h_(?P<size>\d+)").expect("valid size token pattern")
});

/// Strip query string and fragment from a URL
pub fn normalize_url(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |cut| &url[..cut])
}

/// Identity token for an image URL.
///
/// Concatenates every variant token (`_o01_`, `_p03_`, ...) found in the path,
/// in order. Without any token the whole normalized URL is the signature.
///
/// The scan runs over the canonical form, so a preview token counts as its
/// original counterpart and `signature(canonicalize(u)) == signature(u)`.
pub fn signature(raw_url: &str) -> String {
    let normalized = canonicalize(normalize_url(raw_url));
    if normalized.is_empty() {
        return canonicalize(raw_url);
    }

    let mut tokens = String::new();
    for segment in normalized.split('/') {
        if STRUCTURAL_SEGMENTS.contains(&segment) {
            continue;
        }

        // Adjacent tokens share an underscore (`_o01_p02_`), so resume the
        // search on the closing underscore of each match.
        let mut from = 0;
        while let Some(token) = VARIANT_TOKEN.find_at(segment, from) {
            tokens.push_str(token.as_str());
            from = token.end() - 1;
        }
    }

    if tokens.is_empty() { normalized } else { tokens }
}

/// Rewrite an image URL to its highest-fidelity rendition.
///
/// Raises size tokens below [`MAX_SIZE`] to `h_1000` and turns preview markers
/// `_p<n>_` into original markers `_o<n>_`. Everything else is left untouched
/// and applying it twice changes nothing.
pub fn canonicalize(raw_url: &str) -> String {
    let sized = SIZE_TOKEN.replace_all(raw_url, |caps: &Captures| {
        let lead = &caps["lead"];
        let size = &caps["size"];
        match size.parse::<u64>() {
            Ok(value) if value < MAX_SIZE => format!("{lead}h_{MAX_SIZE}"),
            _ => format!("{lead}h_{size}"),
        }
    });

    upgrade_preview_markers(&sized)
}

fn upgrade_preview_markers(url: &str) -> String {
    let mut upgraded = url.to_string();
    let mut from = 0;

    while let Some(marker) = PREVIEW_MARKER.find_at(&upgraded, from) {
        let (letter, end) = (marker.start() + 1, marker.end());
        upgraded.replace_range(letter..=letter, "o");
        from = end - 1;
    }

    upgraded
}

/// Ordering key for the quality of a URL: largest size token first, then
/// original over preview. Higher is better.
pub fn quality_rank(url: &str) -> (u64, bool) {
    let size = SIZE_TOKEN
        .captures_iter(url)
        .map(|caps| caps["size"].parse::<u64>().unwrap_or(u64::MAX))
        .max()
        .unwrap_or(0);

    (size, !PREVIEW_MARKER.is_match(url))
}
