//! Error types shared across the crawling engine.
//!
//! All fallible engine operations return [`CrawlError`]. Collaborator
//! implementations (loaders, parsers, sinks, trackers) map their own failure
//! modes onto these variants so the worker loop can apply a single
//! requeue-or-drop policy.

use thiserror::Error;

/// The error type for all crawl operations.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// A page could not be fetched (network error, timeout, navigation error).
    #[error("failed to load {url}: {message}")]
    Fetch { url: String, message: String },

    /// A required schema field's selector matched no element.
    #[error("no element matched selector `{selector}`")]
    SelectorNotFound { selector: String },

    /// A selector string could not be parsed.
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },

    /// A sink failed to emit a record.
    #[error("sink `{sink}` failed: {message}")]
    Sink { sink: String, message: String },

    /// The visited-link tracker backend failed.
    #[error("link tracker error: {0}")]
    Tracker(String),

    /// Invalid crawler configuration detected at build time.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CrawlError {
    /// Builds a fetch error from any displayable source.
    pub fn fetch(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        CrawlError::Fetch {
            url: url.into(),
            message: err.to_string(),
        }
    }
}
