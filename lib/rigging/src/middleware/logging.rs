//! Transport-level request logging.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use crate::{Error, LogLevel, Request, Response, Result};

/// Layer that logs every request the transport sends and how it ended.
///
/// ```ignore
/// let client = HyperClient::builder().layer(LoggingLayer::debug()).build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

impl LoggingLayer {
    /// Summary logging at info level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request details, headers included, at debug level.
    #[must_use]
    pub const fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let span = span!(
            Level::INFO,
            "http_request",
            method = %request.method(),
            url = request.url(),
            array_format = ?request.array_format(),
            response_type = ?request.response_type(),
            timeout_ms = request.timeout().map(millis),
        );
        let level = self.level;

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();
                log_outgoing(&request, level);

                let result = inner.call(request).await;
                let elapsed_ms = millis(start.elapsed());

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), bytes = response.body().len(), elapsed_ms, "request completed");
                    }
                    Ok(response) => {
                        warn!(status = response.status(), elapsed_ms, "request completed with HTTP error");
                    }
                    Err(err) if err.is_timeout() => warn!(elapsed_ms, "request timed out"),
                    Err(err) => warn!(error = %err, elapsed_ms, "request failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn log_outgoing(request: &Request, level: LogLevel) {
    let params = request.params().len();
    match level {
        LogLevel::Info => info!(params, has_body = !request.data().is_empty(), "sending request"),
        LogLevel::Debug => {
            let wire_url = request
                .to_url()
                .map_or_else(|_| request.url().to_string(), String::from);
            debug!(
                %wire_url,
                headers = ?request.headers(),
                body = %request.data().preview(),
                "sending request"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert2::{check, let_assert};
    use rigging_core::{ArrayFormat, Headers, Method, ResponseType};
    use tower::ServiceExt;

    use super::*;

    #[derive(Clone)]
    struct Echo;

    impl Service<Request> for Echo {
        type Response = Response<Bytes>;
        type Error = Error;
        type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: Request) -> Self::Future {
            Box::pin(async move {
                Ok(Response::new(204, Headers::new(), Bytes::new()).with_request(Arc::new(request)))
            })
        }
    }

    #[test]
    fn logging_layer_levels() {
        assert!(matches!(LoggingLayer::new().level, LogLevel::Info));
        assert!(matches!(LoggingLayer::debug().level, LogLevel::Debug));
    }

    #[tokio::test]
    async fn logs_requests_with_list_queries_and_bodies() {
        let service = LoggingLayer::debug().layer(Echo);
        let request = Request::builder(Method::Post, "http://localhost/posts")
            .query("tags", vec!["a".to_string(), "b".to_string()])
            .array_format(ArrayFormat::Comma)
            .response_type(ResponseType::Text)
            .timeout(Duration::from_millis(250))
            .data(serde_json::json!({"title": "hello"}))
            .build();

        let response = service.oneshot(request).await.expect("response");

        let_assert!(Some(sent) = response.request());
        check!(sent.array_format() == ArrayFormat::Comma);
        let wire_url = String::from(sent.to_url().expect("url"));
        check!(wire_url == "http://localhost/posts?tags=a%2Cb");
    }

    #[tokio::test]
    async fn passes_responses_through() {
        let service = LoggingLayer::debug().layer(Echo);
        let request = Request::builder(Method::Delete, "http://localhost/posts/1").build();

        let response = service.oneshot(request).await.expect("response");

        assert_eq!(response.status(), 204);
        assert_eq!(response.request().map(Request::url), Some("http://localhost/posts/1"));
    }
}
