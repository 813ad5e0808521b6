//! The network seam

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::request::{Request, Response};

/// Performs live network requests
///
/// A fetch resolves to whatever the server sent, including non-2xx
/// statuses; only transport failures are errors.
pub trait Fetcher: Send + Sync {
    /// Fetch `request` from the network
    fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<F: Fetcher> Fetcher for Arc<F> {
    fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).fetch(request)
    }
}
