//! Request and response transformer chains.
//!
//! Request transformers reshape the resolved [`Body`] before it is sent; the
//! default stringify step always runs after them. Response transformers reshape
//! the decoded response data; the default parse step always runs before them.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::{Body, Headers, Method, Result};

/// A request transformer: receives the body and the request headers.
pub type RequestTransformer = Arc<dyn Fn(Body, &Headers) -> Result<Body> + Send + Sync>;

/// A response transformer: receives the data and the response headers.
pub type ResponseTransformer = Arc<dyn Fn(Value, &Headers) -> Result<Value> + Send + Sync>;

/// How response bodies are decoded before response transformers run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResponseType {
    /// Parse as JSON, keeping the text as a JSON string when it is not valid JSON.
    #[default]
    Json,
    /// Keep the body as a JSON string.
    Text,
}

/// Verbosity of the request logging transformer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Emit `DEBUG` events.
    Debug,
    /// Emit `INFO` events.
    #[default]
    Info,
}

/// Request logging settings of a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Log every outgoing request with its body.
    pub show_logs: bool,
    /// Level of the emitted events.
    pub level: LogLevel,
}

impl LoggerOptions {
    /// Enabled logging at the given level.
    #[must_use]
    pub const fn enabled(level: LogLevel) -> Self {
        Self {
            show_logs: true,
            level,
        }
    }
}

/// A transformer logging `[METHOD] url` and the body it receives, unchanged.
#[must_use]
pub fn logging_transformer(method: Method, url: &str, level: LogLevel) -> RequestTransformer {
    let target = format!("[{method}] {url}");
    Arc::new(move |body: Body, _headers: &Headers| {
        let data = body.preview();
        match level {
            LogLevel::Debug => tracing::debug!(request = %target, %data, "sending request"),
            LogLevel::Info => tracing::info!(request = %target, %data, "sending request"),
        }
        Ok(body)
    })
}

/// Default stringify step: turn any body into wire bytes.
///
/// Text and binary bodies are kept as-is, JSON documents are serialized, and
/// multipart forms are encoded (their boundary-carrying content type is
/// returned alongside).
pub fn stringify(body: Body) -> Result<(Body, Option<String>)> {
    match body {
        Body::Empty => Ok((Body::Empty, None)),
        Body::Multipart(form) => {
            let (content_type, bytes) = form.into_body();
            Ok((Body::Binary(bytes), Some(content_type)))
        }
        other => Ok((Body::Binary(other.to_bytes()?), None)),
    }
}

/// Default parse step: decode a response body according to `response_type`.
///
/// An empty body decodes to `null`.
#[must_use]
pub fn parse(body: &Bytes, response_type: ResponseType) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    let text = || Value::String(String::from_utf8_lossy(body).into_owned());
    match response_type {
        ResponseType::Json => serde_json::from_slice(body).unwrap_or_else(|_| text()),
        ResponseType::Text => text(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_json_or_text() {
        assert_eq!(
            parse(&Bytes::from_static(br#"{"a":1}"#), ResponseType::Json),
            json!({"a": 1})
        );
        assert_eq!(
            parse(&Bytes::from_static(b"plain words"), ResponseType::Json),
            json!("plain words")
        );
        assert_eq!(
            parse(&Bytes::from_static(br#"{"a":1}"#), ResponseType::Text),
            json!(r#"{"a":1}"#)
        );
        assert_eq!(parse(&Bytes::new(), ResponseType::Json), Value::Null);
    }

    #[test]
    fn stringify_bodies() {
        let (body, content_type) = stringify(Body::Json(json!({"a": 1}))).expect("json");
        assert_eq!(body, Body::Binary(Bytes::from_static(br#"{"a":1}"#)));
        assert_eq!(content_type, None);

        let (body, _) = stringify(Body::Text("x=1".into())).expect("text");
        assert_eq!(body, Body::Binary(Bytes::from_static(b"x=1")));

        let form = crate::Form::with_boundary("b1").part(crate::Part::text("a", "1"));
        let (_, content_type) = stringify(Body::Multipart(form)).expect("multipart");
        assert_eq!(
            content_type.as_deref(),
            Some("multipart/form-data; boundary=b1")
        );
    }

    #[test]
    fn json_round_trips_through_default_steps() {
        let original = json!({"title": "hello", "tags": ["a", "b"], "n": 1.5, "none": null});
        let (wire, _) = stringify(Body::Json(original.clone())).expect("stringify");
        let bytes = wire.to_bytes().expect("bytes");
        assert_eq!(parse(&bytes, ResponseType::Json), original);
    }

    #[test]
    fn logging_transformer_passes_body_through() {
        let transformer = logging_transformer(Method::Post, "http://localhost/posts", LogLevel::Debug);
        let body = Body::Json(json!({"title": "x"}));
        let out = transformer(body.clone(), &Headers::new()).expect("transform");
        assert_eq!(out, body);
    }
}
