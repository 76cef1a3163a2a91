//! Error types for docweave.
//!
//! Library crates use [`DocweaveError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Two severities exist by convention: sitemap and output-file errors are
//! fatal and abort the run; per-page errors (`PageHttp`, `PageNetwork`,
//! `Extract`) are caught at the page-task boundary, logged, and converted
//! to an absent result.

use std::path::PathBuf;

/// Top-level error type for all docweave operations.
#[derive(Debug, thiserror::Error)]
pub enum DocweaveError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network or non-2xx failure fetching the sitemap itself. Fatal:
    /// there is nothing to crawl.
    #[error("sitemap fetch error: {0}")]
    SitemapFetch(String),

    /// Malformed sitemap XML. Fatal, and distinct from a network failure.
    #[error("sitemap parse error: {0}")]
    SitemapParse(String),

    /// Non-2xx response on an individual page. Recovered: the page is
    /// dropped from its pass.
    #[error("page fetch error: {url}: HTTP {status}")]
    PageHttp { url: String, status: u16 },

    /// Transport-level failure (DNS, TLS, timeout, reset) on an
    /// individual page. Recovered: the page is dropped from its pass.
    #[error("page fetch error: {0}")]
    PageNetwork(String),

    /// HTML parsing or content selection failure on an individual page.
    /// Recovered: the page is kept with empty content.
    #[error("extraction error: {message}")]
    Extract { message: String },

    /// Filesystem I/O error (output file open/write).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocweaveError>;

impl DocweaveError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an extraction error from any displayable message.
    pub fn extract(msg: impl Into<String>) -> Self {
        Self::Extract {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error may be recovered by dropping a single page.
    pub fn is_page_scoped(&self) -> bool {
        matches!(
            self,
            Self::PageHttp { .. } | Self::PageNetwork(_) | Self::Extract { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocweaveError::config("missing sitemap_url");
        assert_eq!(err.to_string(), "config error: missing sitemap_url");

        let err = DocweaveError::PageHttp {
            url: "https://docs.example.com/guide".into(),
            status: 404,
        };
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn page_scoped_classification() {
        assert!(
            DocweaveError::PageNetwork("connection reset".into()).is_page_scoped()
        );
        assert!(DocweaveError::extract("no body element").is_page_scoped());
        assert!(!DocweaveError::SitemapFetch("HTTP 500".into()).is_page_scoped());
        assert!(!DocweaveError::SitemapParse("unclosed tag".into()).is_page_scoped());
    }
}
