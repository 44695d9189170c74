//! Request and response interceptors.
//!
//! Request interceptors see the request descriptor right before the
//! transformer chain runs and it is sent; response interceptors see the raw
//! response right after it arrived, before the status check and the response
//! pipeline. Both run in registration order and either may fail the call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::{Request, Response, Result};

/// Mutates an outgoing request.
pub type RequestInterceptor = Arc<dyn Fn(&mut Request) -> Result<()> + Send + Sync>;

/// Mutates an incoming raw response.
pub type ResponseInterceptor = Arc<dyn Fn(&mut Response<Bytes>) -> Result<()> + Send + Sync>;

/// Identifies a registered interceptor, used to eject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorHandle(u64);

/// Registry of the interceptors of one service.
///
/// Registration and ejection may happen while calls are in flight; a call
/// runs the interceptors registered when its stage starts.
#[derive(Default)]
pub struct Interceptors {
    next_id: AtomicU64,
    request: RwLock<Vec<(InterceptorHandle, RequestInterceptor)>>,
    response: RwLock<Vec<(InterceptorHandle, ResponseInterceptor)>>,
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("request", &self.request.read().len())
            .field("response", &self.response.read().len())
            .finish()
    }
}

impl Interceptors {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_handle(&self) -> InterceptorHandle {
        InterceptorHandle(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a request interceptor.
    pub fn use_request_interceptor<F>(&self, interceptor: F) -> InterceptorHandle
    where
        F: Fn(&mut Request) -> Result<()> + Send + Sync + 'static,
    {
        let handle = self.next_handle();
        self.request.write().push((handle, Arc::new(interceptor)));
        handle
    }

    /// Register a response interceptor.
    pub fn use_response_interceptor<F>(&self, interceptor: F) -> InterceptorHandle
    where
        F: Fn(&mut Response<Bytes>) -> Result<()> + Send + Sync + 'static,
    {
        let handle = self.next_handle();
        self.response.write().push((handle, Arc::new(interceptor)));
        handle
    }

    /// Remove a request interceptor. Returns whether it was registered.
    pub fn eject_request_interceptor(&self, handle: InterceptorHandle) -> bool {
        let mut request = self.request.write();
        let before = request.len();
        request.retain(|(id, _)| *id != handle);
        request.len() != before
    }

    /// Remove a response interceptor. Returns whether it was registered.
    pub fn eject_response_interceptor(&self, handle: InterceptorHandle) -> bool {
        let mut response = self.response.write();
        let before = response.len();
        response.retain(|(id, _)| *id != handle);
        response.len() != before
    }

    /// Run the request interceptors in registration order.
    pub fn intercept_request(&self, request: &mut Request) -> Result<()> {
        let interceptors: Vec<_> = self.request.read().iter().map(|(_, f)| Arc::clone(f)).collect();
        for interceptor in interceptors {
            interceptor(request)?;
        }
        Ok(())
    }

    /// Run the response interceptors in registration order.
    pub fn intercept_response(&self, response: &mut Response<Bytes>) -> Result<()> {
        let interceptors: Vec<_> = self.response.read().iter().map(|(_, f)| Arc::clone(f)).collect();
        for interceptor in interceptors {
            interceptor(response)?;
        }
        Ok(())
    }
}
