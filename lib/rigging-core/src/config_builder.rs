//! Assembly of the per-call request descriptor.

use std::time::Duration;

use indexmap::IndexMap;

use crate::transform::logging_transformer;
use crate::{
    ArrayFormat, Body, Headers, LoggerOptions, Method, MethodMetadata, QueryValue, Request,
    ResponseType,
};

/// Default service-level timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Raw per-method overrides, applied after everything else.
///
/// Each set field replaces the corresponding descriptor field wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverride {
    /// Replace the URL.
    pub url: Option<String>,
    /// Replace the HTTP method.
    pub method: Option<Method>,
    /// Replace all headers.
    pub headers: Option<Headers>,
    /// Replace all query parameters.
    pub params: Option<IndexMap<String, QueryValue>>,
    /// Replace the array format.
    pub array_format: Option<ArrayFormat>,
    /// Replace the body.
    pub data: Option<Body>,
    /// Replace the timeout.
    pub timeout: Option<Duration>,
    /// Replace the response type.
    pub response_type: Option<ResponseType>,
}

/// Service-level settings the config builder needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Timeout used when the method declares none.
    pub timeout: Duration,
    /// Request logging.
    pub logger: LoggerOptions,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            logger: LoggerOptions::default(),
        }
    }
}

/// Build the request descriptor of one call.
///
/// Later steps override earlier ones: the resolved parts, the method response
/// type, the method transformer chains (the logging transformer, when enabled,
/// runs after them and right before the default stringify step), the timeout
/// (method level, else service level), and finally the raw overrides.
#[must_use]
#[expect(clippy::too_many_arguments)]
pub fn make_config(
    metadata: &MethodMetadata,
    builder_config: &BuilderConfig,
    method_name: &str,
    url: String,
    method: Method,
    headers: Headers,
    query: IndexMap<String, QueryValue>,
    data: Body,
) -> Request {
    if metadata.is_deprecated() {
        let hint = metadata.deprecation_hint().unwrap_or_default();
        tracing::warn!(method = method_name, hint, "calling a deprecated method");
    }

    let logger = builder_config
        .logger
        .show_logs
        .then(|| logging_transformer(method, &url, builder_config.logger.level));

    let mut builder = Request::builder(method, url)
        .headers(headers)
        .params(query)
        .array_format(metadata.array_format)
        .data(data)
        .response_type(metadata.response_type.unwrap_or_default())
        .transform_request(metadata.request_transformers.iter().cloned())
        .transform_request(logger)
        .transform_response(metadata.response_transformers.iter().cloned())
        .timeout(metadata.timeout.unwrap_or(builder_config.timeout));

    let overrides = &metadata.config;
    if let Some(url) = &overrides.url {
        builder = builder.url(url.clone());
    }
    if let Some(method) = overrides.method {
        builder = builder.method(method);
    }
    if let Some(headers) = &overrides.headers {
        builder = builder.headers(headers.clone());
    }
    if let Some(params) = &overrides.params {
        builder = builder.params(params.clone());
    }
    if let Some(array_format) = overrides.array_format {
        builder = builder.array_format(array_format);
    }
    if let Some(data) = &overrides.data {
        builder = builder.data(data.clone());
    }
    if let Some(timeout) = overrides.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(response_type) = overrides.response_type {
        builder = builder.response_type(response_type);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::LogLevel;

    /// Formatted log output, shared with the subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn output(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn build(metadata: &MethodMetadata, config: &BuilderConfig) -> Request {
        make_config(
            metadata,
            config,
            "test",
            "http://localhost/posts".to_string(),
            Method::Post,
            [("Content-Type", "application/json")].into_iter().collect(),
            IndexMap::new(),
            Body::Json(json!({"title": "x"})),
        )
    }

    #[test]
    fn timeout_falls_back_to_service_level() {
        let metadata = MethodMetadata::builder(Method::Post, "/posts").build();
        let request = build(&metadata, &BuilderConfig::default());
        assert_eq!(request.timeout(), Some(DEFAULT_TIMEOUT));

        let metadata = MethodMetadata::builder(Method::Post, "/posts")
            .timeout(Duration::from_millis(250))
            .build();
        let request = build(&metadata, &BuilderConfig::default());
        assert_eq!(request.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn deprecated_method_warns_without_changing_the_request() {
        let current = MethodMetadata::builder(Method::Post, "/posts").build();
        let deprecated = MethodMetadata::builder(Method::Post, "/posts")
            .deprecated(Some("use create_post"))
            .build();

        let logs = Captured::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let (plain, warned) = tracing::subscriber::with_default(subscriber, || {
            (
                build(&current, &BuilderConfig::default()),
                build(&deprecated, &BuilderConfig::default()),
            )
        });

        let output = logs.output();
        assert_eq!(output.matches("calling a deprecated method").count(), 1);
        assert!(output.contains("use create_post"), "unexpected logs: {output}");

        assert_eq!(warned.method(), plain.method());
        assert_eq!(warned.url(), plain.url());
        assert_eq!(warned.headers(), plain.headers());
        assert_eq!(warned.data().as_json(), plain.data().as_json());
        assert_eq!(warned.timeout(), plain.timeout());
    }

    #[test]
    fn response_type_from_metadata() {
        let metadata = MethodMetadata::builder(Method::Post, "/posts")
            .response_type(ResponseType::Text)
            .build();
        let request = build(&metadata, &BuilderConfig::default());
        assert_eq!(request.response_type(), ResponseType::Text);
    }

    #[test]
    fn logging_transformer_runs_after_method_transformers() {
        let metadata = MethodMetadata::builder(Method::Post, "/posts")
            .request_transformer(|_body, _headers| Ok(Body::Text("replaced".into())))
            .build();
        let config = BuilderConfig {
            logger: LoggerOptions::enabled(LogLevel::Debug),
            ..BuilderConfig::default()
        };

        let mut request = build(&metadata, &config);
        request.apply_transformers().expect("transform");

        assert_eq!(request.body_bytes().expect("bytes").as_ref(), b"replaced");
    }

    #[test]
    fn raw_overrides_apply_last() {
        let metadata = MethodMetadata::builder(Method::Post, "/posts")
            .timeout(Duration::from_secs(1))
            .config(ConfigOverride {
                url: Some("http://override/".into()),
                method: Some(Method::Put),
                timeout: Some(Duration::from_secs(5)),
                ..ConfigOverride::default()
            })
            .build();

        let request = build(&metadata, &BuilderConfig::default());

        assert_eq!(request.url(), "http://override/");
        assert_eq!(request.method(), Method::Put);
        assert_eq!(request.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn response_transformers_are_carried() {
        let metadata = MethodMetadata::builder(Method::Get, "/posts")
            .response_transformer(|data, _headers| Ok(data))
            .response_transformer(|data, _headers| Ok(data))
            .build();
        let request = build(&metadata, &BuilderConfig::default());
        assert_eq!(request.response_transformers().len(), 2);
    }
}
