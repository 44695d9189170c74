//! HTTP transport using hyper-util.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use parking_lot::Mutex;
use rigging_core::{DEFAULT_TIMEOUT, Headers, HttpClient};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::middleware::LoggingLayer;
use crate::{Error, Request, Response, Result};

/// Type-erased transport service, the unit tower layers compose over.
pub type BoxedService = BoxCloneService<Request, Response<Bytes>, Error>;

/// Future type of the tower `Service` implementations.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send + 'static>>;

type LayerFn = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Makes a `BoxedService` shareable between calls.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ServiceFuture {
        let mut service = self.inner.lock().clone();
        Box::pin(async move { service.call(request).await })
    }
}

fn https_connector(connect_timeout: Duration) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(http)
}

/// Innermost service: one request, one hyper round trip.
#[derive(Clone)]
struct RawHyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Duration,
}

impl RawHyperClient {
    fn new(builder: &HyperClientBuilder) -> Self {
        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(builder.pool_idle_timeout)
            .pool_max_idle_per_host(builder.pool_idle_per_host)
            .retry_canceled_requests(builder.retry_canceled_requests)
            .build(https_connector(builder.connect_timeout));

        Self {
            inner,
            timeout: builder.timeout,
        }
    }

    fn build_hyper_request(request: &Request) -> Result<http::Request<Full<Bytes>>> {
        let url = request.to_url()?;
        let mut builder = http::Request::builder()
            .method(http::Method::from(request.method()))
            .uri(url.as_str());

        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }

        builder
            .body(Full::new(request.body_bytes()?))
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    fn extract_headers(headers: &http::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .collect()
    }

    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        let hyper_request = Self::build_hyper_request(&request)?;
        let timeout = request.timeout().unwrap_or(self.timeout);

        let response = tokio::time::timeout(timeout, self.inner.request(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        Ok(Response::new(status, headers, body).with_request(Arc::new(request)))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();
        let lower = msg.to_lowercase();

        if lower.contains("ssl") || lower.contains("tls") || lower.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

impl Service<Request> for RawHyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await })
    }
}

/// The default [`HttpClient`]: hyper-util with connection pooling, rustls and
/// tower middleware.
///
/// ```ignore
/// use rigging::HyperClient;
///
/// let client = HyperClient::builder()
///     .connect_timeout(Duration::from_secs(2))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperClient {
    service: SyncService,
    timeout: Duration,
}

impl std::fmt::Debug for HyperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HyperClient {
    /// Client with default settings and no middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start a client builder.
    #[must_use]
    pub fn builder() -> HyperClientBuilder {
        HyperClientBuilder::default()
    }

    /// Timeout applied to requests that carry none of their own.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HyperClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for HyperClient {
    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        self.service.call(request).await
    }
}

impl Service<Request> for HyperClient {
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        self.service.call(request)
    }
}

/// Builder for [`HyperClient`].
///
/// Requests without a timeout of their own fall back to the builder's, which
/// defaults to the same 60 s as a service-level timeout.
pub struct HyperClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    pool_idle_per_host: usize,
    pool_idle_timeout: Duration,
    retry_canceled_requests: bool,
    layers: Vec<LayerFn>,
}

impl Default for HyperClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            retry_canceled_requests: true,
            layers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for HyperClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperClientBuilder")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("pool_idle_per_host", &self.pool_idle_per_host)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("retry_canceled_requests", &self.retry_canceled_requests)
            .field("layers_count", &self.layers.len())
            .finish()
    }
}

impl HyperClientBuilder {
    /// Timeout used when a request carries none.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Connection establishment timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Maximum idle connections kept per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = count;
        self
    }

    /// How long idle connections are kept.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Retry requests whose pooled connection closed before use.
    #[must_use]
    pub const fn retry_canceled_requests(mut self, retry: bool) -> Self {
        self.retry_canceled_requests = retry;
        self
    }

    /// Add a tower layer. The first layer added is the outermost one.
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send,
    {
        self.layers
            .push(Arc::new(move |service| BoxCloneService::new(layer.layer(service))));
        self
    }

    /// Log every request with a [`LoggingLayer`].
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Log every request, with headers, at debug level.
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> HyperClient {
        let mut service: BoxedService = BoxCloneService::new(RawHyperClient::new(&self));

        for layer_fn in self.layers.into_iter().rev() {
            service = layer_fn(service);
        }

        HyperClient {
            service: SyncService::new(service),
            timeout: self.timeout,
        }
    }
}
