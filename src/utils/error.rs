//! Error types for manifest retrieval and parsing
//!
//! These errors never escape the resolver: a failing candidate is logged and
//! skipped. They are public so transports and tests can name them.

use thiserror::Error;

/// Errors that can occur while retrieving a candidate document
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status code
    #[error("Unexpected status: {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Local file could not be read
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Location could not be resolved to a URL or path
    #[error("Invalid location: {0}")]
    InvalidLocation(String),
}

impl FetchError {
    /// Short label used for metrics and log fields
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Status(_) => "status",
            Self::Timeout => "timeout",
            Self::Io { .. } => "io",
            Self::InvalidLocation(_) => "location",
        }
    }
}

/// Errors that make a retrieved body unusable as a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Body is not JSON or does not match the expected document shape
    #[error("Malformed manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// Body is JSON but its top-level shape is wrong
    #[error("Invalid manifest shape: {0}")]
    InvalidShape(String),

    /// Two races share an identifier
    #[error("Duplicate race id: {0}")]
    DuplicateId(String),
}

/// Why a single candidate was skipped
#[derive(Error, Debug)]
pub enum CandidateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

impl CandidateError {
    /// Short label used for metrics and log fields
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.reason(),
            Self::Manifest(_) => "malformed",
        }
    }
}
