//! Error types for journalcache

use std::fmt;
use std::io;

use crate::lifecycle::WorkerState;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache and fetch operations
#[derive(Debug)]
pub enum Error {
    /// I/O error on a cache file
    Io(io::Error),

    /// Cache file is malformed
    Parse(String),

    /// Request could not be completed over the network
    Network {
        /// Requested URL
        url: String,
        /// What went wrong
        reason: String,
    },

    /// Response arrived with a non-2xx status where one was required
    Status {
        /// Requested URL
        url: String,
        /// Status code received
        status: u16,
    },

    /// Lifecycle step invoked from the wrong state
    InvalidState {
        /// State the step requires
        expected: WorkerState,
        /// State the worker was in
        actual: WorkerState,
    },

    /// Cache name cannot be used as a store name
    InvalidCacheName(String),

    /// No stored generation of this name
    CacheNotFound(String),

    /// A stored generation lacks a seed response and cannot be resumed
    MissingSeed {
        /// Generation name
        cache: String,
        /// Seed URL with no stored response
        url: String,
    },
}

impl Error {
    /// Build a network error for `url`
    pub fn network(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Error::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::Network { url, reason } => write!(f, "Fetch of {} failed: {}", url, reason),
            Error::Status { url, status } => {
                write!(f, "Fetch of {} returned status {}", url, status)
            }
            Error::InvalidState { expected, actual } => {
                write!(f, "Worker is {}, expected {}", actual, expected)
            }
            Error::InvalidCacheName(name) => write!(f, "Invalid cache name: {:?}", name),
            Error::CacheNotFound(name) => write!(f, "No stored cache named {}", name),
            Error::MissingSeed { cache, url } => {
                write!(f, "Cache {} has no stored response for {}", cache, url)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
