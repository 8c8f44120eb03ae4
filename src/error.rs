//! Error taxonomy for every boundary the browser touches.
//!
//! Each variant maps to one way of surfacing the failure in the UI; none of
//! them end the session.

use thiserror::Error;

/// Errors raised by the store, the filter/decoder/search passes and the
/// navigation transitions.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// Credentials for the profile could not be resolved or were rejected
    #[error("authentication failed for profile '{profile}': {message}")]
    Auth { profile: String, message: String },

    /// Listing or fetch failed on the network / service side
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// The profile is valid but may not list this bucket or read this key
    #[error("access denied: {0}")]
    Denied(String),

    /// Key (or bucket) vanished between listing and fetch
    #[error("object not found: {0}")]
    NotFound(String),

    /// Compressed framing is invalid (bad magic, truncation, checksum)
    #[error("failed to decode archive: {0}")]
    Decode(String),

    /// Search pattern does not compile
    #[error("invalid regular expression: {0}")]
    Pattern(#[from] regex::Error),

    /// Date or time filter input could not be parsed
    #[error("invalid {field} filter '{input}': expected {expected}")]
    InvalidFilter {
        field: &'static str,
        input: String,
        expected: &'static str,
    },

    /// Decode requested on a key without the archive extension
    #[error("'{0}' is not a .gz archive")]
    NotArchive(String),

    /// Decode requested with no file selected
    #[error("no object selected")]
    NothingSelected,
}

impl BrowseError {
    /// Whether the error blocks the whole session until the profile changes
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowseError::Auth { .. })
    }

    /// Whether repeating the same action may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, BrowseError::Connectivity(_))
    }
}

pub type Result<T> = std::result::Result<T, BrowseError>;
