//! Error types for journalnav

use std::fmt;

use crate::page::EntryId;

/// Result type alias for navigation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for navigation operations
#[derive(Debug)]
pub enum Error {
    /// No entry record carries this identifier
    EntryNotFound(EntryId),

    /// URL fragment does not name a page
    InvalidFragment(String),

    /// Entry identifier is not a positive integer
    InvalidEntryId(String),

    /// History state or entry list is not valid JSON for its shape
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EntryNotFound(id) => write!(f, "Entry {} not found", id),
            Error::InvalidFragment(frag) => write!(f, "Unknown page fragment: {:?}", frag),
            Error::InvalidEntryId(raw) => write!(f, "Invalid entry id: {:?}", raw),
            Error::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
