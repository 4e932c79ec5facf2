//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use url::form_urlencoded;

/// Percent-encode a race identifier for use as a single path segment
///
/// Identifiers come straight from the manifest, so anything outside the
/// unreserved set is escaped. The result is also safe as a file name.
pub fn encode_path_segment(id: &str) -> String {
    form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
