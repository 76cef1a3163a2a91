//! Page fetching and content extraction.
//!
//! This crate provides:
//! - [`Fetcher`] — rate- and concurrency-limited HTTP GET with a permit pool
//! - [`extract`] — title extraction and HTML-to-text body extraction

pub mod extract;
pub mod fetch;

pub use extract::{Extracted, Extractor, extract_title};
pub use fetch::{FetchSuccess, Fetcher};
