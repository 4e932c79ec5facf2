//! Unified error handling for the racecard crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! Note that manifest resolution itself never fails: retrieval and parse errors
//! are absorbed by the resolver. The errors here surface from configuration,
//! rendering, selection and the server.
//!
//! # Usage
//!
//! ```rust,ignore
//! use racecard::error::{Error, RacecardErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.user_message());
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::render::RenderError;
pub use crate::selection::SelectionError;
pub use crate::server::ServerError;
pub use crate::utils::error::{CandidateError, FetchError, ManifestError};

/// Common trait for all racecard error types
pub trait RacecardErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get message for user-facing output
    fn user_message(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout)
    Network,
    /// Parsing and data extraction errors
    Parsing,
    /// Storage and I/O errors
    Storage,
    /// Template rendering errors
    Rendering,
    /// Selection errors (unknown race chosen)
    Selection,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get description for the category
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "network error",
            Self::Parsing => "parsing error",
            Self::Storage => "storage error",
            Self::Rendering => "rendering error",
            Self::Selection => "selection error",
            Self::Config => "configuration error",
            Self::Other => "other error",
        }
    }
}

/// Unified error type for the racecard crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Manifest parse and validation errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Selection errors
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Template rendering errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<CandidateError> for Error {
    fn from(err: CandidateError) -> Self {
        match err {
            CandidateError::Fetch(e) => Self::Fetch(e),
            CandidateError::Manifest(e) => Self::Manifest(e),
        }
    }
}

impl RacecardErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => !matches!(e, FetchError::InvalidLocation(_)),
            Self::Manifest(_) => false,
            Self::Selection(_) => true, // the previous selection stays valid
            Self::Render(_) => false,
            Self::Server(_) => false,
            Self::Config(_) => false,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Other { context, .. } => context.clone(),
            other => format!("{}: {other}", other.category().description()),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(FetchError::Io { .. }) => ErrorCategory::Storage,
            Self::Fetch(_) | Self::Server(_) => ErrorCategory::Network,
            Self::Manifest(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::Selection(_) => ErrorCategory::Selection,
            Self::Render(_) => ErrorCategory::Rendering,
            Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) => ErrorCategory::Storage,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// First racecard error in an `anyhow` chain, looking through context
    pub fn find_in(err: &anyhow::Error) -> Option<&Error> {
        err.chain().find_map(|cause| cause.downcast_ref::<Error>())
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let fetch_err = Error::Fetch(FetchError::Timeout);
        assert_eq!(fetch_err.category(), ErrorCategory::Network);

        let manifest_err = Error::Manifest(ManifestError::DuplicateId("r1".into()));
        assert_eq!(manifest_err.category(), ErrorCategory::Parsing);

        let io_fetch = Error::Fetch(FetchError::Io {
            path: "data/races.json".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        });
        assert_eq!(io_fetch.category(), ErrorCategory::Storage);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(Error::Fetch(FetchError::Status(503)).is_recoverable());
        assert!(!Error::Fetch(FetchError::InvalidLocation("::".into())).is_recoverable());
        assert!(!Error::Manifest(ManifestError::DuplicateId("r1".into())).is_recoverable());
    }

    #[test]
    fn test_candidate_error_conversion() {
        let unified: Error = CandidateError::Fetch(FetchError::Timeout).into();
        assert!(matches!(unified, Error::Fetch(FetchError::Timeout)));

        let unified: Error = CandidateError::Manifest(ManifestError::DuplicateId("r1".into())).into();
        assert!(matches!(unified, Error::Manifest(ManifestError::DuplicateId(_))));
    }

    #[test]
    fn test_selection_error() {
        let err: Error = SelectionError::UnknownRace("r9".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::Selection);
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("r9"));
    }

    #[test]
    fn test_other_error() {
        let err = Error::from(anyhow::anyhow!("Something went wrong"));
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.user_message(), "Something went wrong");
    }

    #[test]
    fn test_find_in_looks_through_context() {
        use anyhow::Context;

        let result: std::result::Result<(), Error> = Err(FetchError::Status(503).into());
        let err = result.context("Failed to create resolver").unwrap_err();

        let found = Error::find_in(&err).unwrap();
        assert_eq!(found.category(), ErrorCategory::Network);
        assert!(found.is_recoverable());
        assert!(found.user_message().contains("503"));

        assert!(Error::find_in(&anyhow::anyhow!("plain")).is_none());
    }
}
