//! The transport seam.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// Sends fully built requests.
///
/// The request body has already been through the transformer chain when
/// `execute` is called. Implementations return every response they receive,
/// whatever its status; failing on non-2xx statuses is the caller's job.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
