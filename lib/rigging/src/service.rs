//! The service entry point: one [`Service`] per [`ServiceMetadata`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use rigging_core::{
    Arg, BuilderConfig, DEFAULT_TIMEOUT, LoggerOptions, PipelineOptions, ServiceMetadata,
    create_data_resolver, make_config, process_response, resolve_body, resolve_headers,
    resolve_query, resolve_url,
};

use crate::{
    Error, History, HttpClient, HyperClient, InterceptorHandle, Interceptors, Reply, Request,
    Response, Result,
};

/// Callback run once per call, with its [`Completion`].
pub type OnComplete = Arc<dyn Fn(&Completion<'_>) + Send + Sync>;

/// Everything a finished call produced, successful or not.
#[derive(Debug)]
pub struct Completion<'a> {
    /// Name of the invoked method.
    pub method_name: &'a str,
    /// The request as dispatched, `None` when the call failed while binding
    /// arguments.
    pub request: Option<&'a Request>,
    /// The transport response, `None` when nothing came back.
    pub response: Option<&'a Response<Bytes>>,
    /// What [`Service::invoke`] returns.
    pub result: &'a Result<Reply>,
}

#[derive(Default)]
struct Trace {
    request: Option<Arc<Request>>,
    response: Option<Response<Bytes>>,
}

/// Builder for [`Service`].
///
/// ```ignore
/// let posts = ServiceBuilder::new()
///     .endpoint("https://jsonplaceholder.typicode.com")
///     .inline_response_body()
///     .build(metadata);
/// let reply = posts.invoke("get_post", &args![1]).await?;
/// ```
pub struct ServiceBuilder<C = HyperClient> {
    endpoint: String,
    timeout: Duration,
    inline: bool,
    validate: bool,
    save_history: bool,
    logger: LoggerOptions,
    interceptors: Interceptors,
    on_complete: Option<OnComplete>,
    client: C,
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceBuilder {
    /// A builder sending through a default [`HyperClient`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: String::new(),
            timeout: DEFAULT_TIMEOUT,
            inline: false,
            validate: false,
            save_history: false,
            logger: LoggerOptions::default(),
            interceptors: Interceptors::new(),
            on_complete: None,
            client: HyperClient::new(),
        }
    }
}

impl<C> std::fmt::Debug for ServiceBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("inline", &self.inline)
            .field("validate", &self.validate)
            .field("save_history", &self.save_history)
            .field("logger", &self.logger)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClient> ServiceBuilder<C> {
    /// Prefix of every URL, before the base path.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Alias of [`endpoint`](Self::endpoint).
    #[must_use]
    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        self.endpoint(base_url)
    }

    /// Timeout of methods declaring none.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return only response data instead of full responses.
    #[must_use]
    pub const fn inline_response_body(mut self) -> Self {
        self.inline = true;
        self
    }

    /// Validate converted response data.
    #[must_use]
    pub const fn validate_response(mut self) -> Self {
        self.validate = true;
        self
    }

    /// Keep every decoded response for [`Service::last_request`].
    #[must_use]
    pub const fn save_request_history(mut self) -> Self {
        self.save_history = true;
        self
    }

    /// Log every outgoing request with its body.
    #[must_use]
    pub const fn logging(mut self, logger: LoggerOptions) -> Self {
        self.logger = logger;
        self
    }

    /// Register a request interceptor.
    #[must_use]
    pub fn request_interceptor<F>(self, interceptor: F) -> Self
    where
        F: Fn(&mut Request) -> Result<()> + Send + Sync + 'static,
    {
        self.interceptors.use_request_interceptor(interceptor);
        self
    }

    /// Register a response interceptor.
    #[must_use]
    pub fn response_interceptor<F>(self, interceptor: F) -> Self
    where
        F: Fn(&mut Response<Bytes>) -> Result<()> + Send + Sync + 'static,
    {
        self.interceptors.use_response_interceptor(interceptor);
        self
    }

    /// Run `callback` after every call, successful or not.
    #[must_use]
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Completion<'_>) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    /// Send through another transport.
    #[must_use]
    pub fn client<C2: HttpClient>(self, client: C2) -> ServiceBuilder<C2> {
        ServiceBuilder {
            endpoint: self.endpoint,
            timeout: self.timeout,
            inline: self.inline,
            validate: self.validate,
            save_history: self.save_history,
            logger: self.logger,
            interceptors: self.interceptors,
            on_complete: self.on_complete,
            client,
        }
    }

    /// Build the service for the given method declarations.
    #[must_use]
    pub fn build(self, metadata: ServiceMetadata) -> Service<C> {
        Service {
            inner: Arc::new(ServiceInner {
                metadata,
                endpoint: self.endpoint,
                config: BuilderConfig {
                    timeout: self.timeout,
                    logger: self.logger,
                },
                options: PipelineOptions {
                    validate: self.validate,
                    inline: self.inline,
                },
                save_history: self.save_history,
                history: History::new(),
                interceptors: self.interceptors,
                on_complete: self.on_complete,
                client: self.client,
            }),
        }
    }
}

struct ServiceInner<C> {
    metadata: ServiceMetadata,
    endpoint: String,
    config: BuilderConfig,
    options: PipelineOptions,
    save_history: bool,
    history: History,
    interceptors: Interceptors,
    on_complete: Option<OnComplete>,
    client: C,
}

/// A declared HTTP API, callable by method name.
///
/// Cloning is cheap; clones share interceptors and history.
pub struct Service<C = HyperClient> {
    inner: Arc<ServiceInner<C>>,
}

impl<C> Clone for Service<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> std::fmt::Debug for Service<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("endpoint", &self.inner.endpoint)
            .field("base_path", &self.inner.metadata.base_path())
            .field("config", &self.inner.config)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<C: HttpClient> Service<C> {
    /// Call a declared method.
    ///
    /// # Errors
    ///
    /// Unknown methods, methods without HTTP verb and argument binding
    /// failures fail before anything is sent. Afterwards transport failures,
    /// interceptor failures, non-2xx statuses ([`Error::Http`]), and
    /// conversion or validation failures are returned.
    pub async fn invoke(&self, method_name: &str, args: &[Arg]) -> Result<Reply> {
        let mut trace = Trace::default();
        let result = self.call(method_name, args, &mut trace).await;
        if let Some(on_complete) = &self.inner.on_complete {
            on_complete(&Completion {
                method_name,
                request: trace.request.as_deref(),
                response: trace.response.as_ref(),
                result: &result,
            });
        }
        result
    }

    async fn call(&self, method_name: &str, args: &[Arg], trace: &mut Trace) -> Result<Reply> {
        let inner = &*self.inner;
        let metadata = inner.metadata.get_metadata(method_name)?;
        let method = metadata
            .method()
            .ok_or_else(|| Error::NoHttpMethod(method_name.to_string()))?;

        let url = resolve_url(metadata, &inner.endpoint, inner.metadata.base_path(), args);
        let headers = resolve_headers(metadata, args)?;
        let query = resolve_query(metadata, args)?;
        let payload = resolve_body(metadata, args)?;
        let content_type = headers.content_type().unwrap_or("application/json");
        let data = create_data_resolver(content_type).resolve(&headers, payload)?;

        let mut request = make_config(metadata, &inner.config, method_name, url, method, headers, query, data);
        let prepared = inner
            .interceptors
            .intercept_request(&mut request)
            .and_then(|()| request.apply_transformers());
        let request = Arc::new(request);
        trace.request = Some(Arc::clone(&request));
        prepared?;

        tracing::debug!(method = method_name, http_method = %request.method(), url = request.url(), "dispatching request");
        let mut response = inner.client.execute(Request::clone(&request)).await?;
        if response.request().is_none() {
            response = response.with_request(request);
        }

        let intercepted = inner.interceptors.intercept_response(&mut response);
        if inner.on_complete.is_some() {
            trace.response = Some(response.clone());
        }
        intercepted?;
        check_status(&response)?;

        let reply = process_response(
            response,
            metadata,
            PipelineOptions {
                inline: false,
                ..inner.options
            },
        )?;
        if inner.save_history
            && let Some(response) = reply.response()
        {
            inner.history.record(response.clone());
        }

        Ok(if inner.options.inline {
            Reply::Inline(reply.into_data())
        } else {
            reply
        })
    }

    /// The newest recorded response.
    ///
    /// # Errors
    ///
    /// [`Error::NoRequestsInHistory`] when nothing was recorded, which is
    /// always the case unless history was enabled.
    pub fn last_request(&self) -> Result<Response<Value>> {
        self.inner.history.last()
    }

    /// Snapshot of every recorded response, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Response<Value>> {
        self.inner.history.entries()
    }

    /// Register a request interceptor on the built service.
    pub fn use_request_interceptor<F>(&self, interceptor: F) -> InterceptorHandle
    where
        F: Fn(&mut Request) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.interceptors.use_request_interceptor(interceptor)
    }

    /// Register a response interceptor on the built service.
    pub fn use_response_interceptor<F>(&self, interceptor: F) -> InterceptorHandle
    where
        F: Fn(&mut Response<Bytes>) -> Result<()> + Send + Sync + 'static,
    {
        self.inner.interceptors.use_response_interceptor(interceptor)
    }

    /// The interceptor registry, for ejecting.
    #[must_use]
    pub fn interceptors(&self) -> &Interceptors {
        &self.inner.interceptors
    }

    /// The method declarations.
    #[must_use]
    pub fn metadata(&self) -> &ServiceMetadata {
        &self.inner.metadata
    }

    /// The endpoint every URL starts with.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }
}

fn check_status(response: &Response<Bytes>) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    let status = response.status();
    let reason = http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("unknown status");
    tracing::debug!(status, "request failed with HTTP error");
    Err(Error::http_with_response(
        status,
        reason,
        response.headers().clone(),
        response.body().clone(),
    ))
}
