//! The request descriptor built once per call.
//!
//! A [`Request`] holds the resolved URL, verb, headers, query parameters and
//! body of a call, along with its transformer chains and timeout. Request
//! interceptors may mutate it before [`Request::apply_transformers`] turns the
//! body into wire bytes.
//!
//! # Example
//!
//! ```
//! use rigging_core::{ArrayFormat, Method, Request};
//!
//! let request = Request::builder(Method::Get, "https://api.example.com/posts")
//!     .header("Accept", "application/json")
//!     .query("tags", vec!["a".to_string(), "b".to_string()])
//!     .array_format(ArrayFormat::Repeat)
//!     .build();
//!
//! let url = request.to_url().expect("valid URL");
//! assert_eq!(url.as_str(), "https://api.example.com/posts?tags=a&tags=b");
//! ```

use std::time::Duration;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::{
    ArrayFormat, Body, Headers, Method, QueryValue, RequestTransformer, ResponseTransformer,
    ResponseType, Result,
};

/// A fully resolved request.
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: Headers,
    params: IndexMap<String, QueryValue>,
    array_format: ArrayFormat,
    data: Body,
    timeout: Option<Duration>,
    response_type: ResponseType,
    transform_request: Vec<RequestTransformer>,
    transform_response: Vec<ResponseTransformer>,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, url.into())
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL, without query parameters.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Replace the URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to headers.
    pub const fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Query parameters.
    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, QueryValue> {
        &self.params
    }

    /// Mutable access to query parameters.
    pub const fn params_mut(&mut self) -> &mut IndexMap<String, QueryValue> {
        &mut self.params
    }

    /// Encoding of list-valued query parameters.
    #[must_use]
    pub const fn array_format(&self) -> ArrayFormat {
        self.array_format
    }

    /// Request body.
    #[must_use]
    pub const fn data(&self) -> &Body {
        &self.data
    }

    /// Replace the request body.
    pub fn set_data(&mut self, data: impl Into<Body>) {
        self.data = data.into();
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// How the response body is decoded.
    #[must_use]
    pub const fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Response transformers, in registration order.
    #[must_use]
    pub fn response_transformers(&self) -> &[ResponseTransformer] {
        &self.transform_response
    }

    /// Full URL with the query string encoded according to the array format.
    pub fn to_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.url)?;
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.params {
                match value {
                    QueryValue::Single(value) => {
                        pairs.append_pair(name, value);
                    }
                    QueryValue::List(values) => match self.array_format {
                        ArrayFormat::Indices => {
                            for (index, value) in values.iter().enumerate() {
                                pairs.append_pair(&format!("{name}[{index}]"), value);
                            }
                        }
                        ArrayFormat::Brackets => {
                            let key = format!("{name}[]");
                            for value in values {
                                pairs.append_pair(&key, value);
                            }
                        }
                        ArrayFormat::Repeat => {
                            for value in values {
                                pairs.append_pair(name, value);
                            }
                        }
                        ArrayFormat::Comma => {
                            pairs.append_pair(name, &values.join(","));
                        }
                    },
                }
            }
        }
        Ok(url)
    }

    /// Run the request transformer chain, then the default stringify step.
    ///
    /// Afterwards the body is empty or binary. A multipart body sets the
    /// boundary-carrying `Content-Type`.
    pub fn apply_transformers(&mut self) -> Result<()> {
        let mut data = std::mem::take(&mut self.data);
        for transformer in &self.transform_request {
            data = transformer(data, &self.headers)?;
        }
        let (data, content_type) = crate::transform::stringify(data)?;
        if let Some(content_type) = content_type {
            self.headers.insert("Content-Type", content_type);
        }
        self.data = data;
        Ok(())
    }

    /// Wire bytes of the body.
    pub fn body_bytes(&self) -> Result<Bytes> {
        self.data.to_bytes()
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("array_format", &self.array_format)
            .field("data", &self.data)
            .field("timeout", &self.timeout)
            .field("response_type", &self.response_type)
            .field("transform_request", &self.transform_request.len())
            .field("transform_response", &self.transform_response.len())
            .finish()
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Clone)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: String) -> Self {
        Self {
            request: Request {
                method,
                url,
                headers: Headers::new(),
                params: IndexMap::new(),
                array_format: ArrayFormat::default(),
                data: Body::Empty,
                timeout: None,
                response_type: ResponseType::default(),
                transform_request: Vec::new(),
                transform_response: Vec::new(),
            },
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    /// Sets the URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.request.url = url.into();
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.insert(name, value);
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: Headers) -> Self {
        self.request.headers = headers;
        self
    }

    /// Sets a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.request.params.insert(name.into(), value.into());
        self
    }

    /// Replaces all query parameters.
    #[must_use]
    pub fn params(mut self, params: IndexMap<String, QueryValue>) -> Self {
        self.request.params = params;
        self
    }

    /// Encoding of list-valued query parameters.
    #[must_use]
    pub const fn array_format(mut self, array_format: ArrayFormat) -> Self {
        self.request.array_format = array_format;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn data(mut self, data: impl Into<Body>) -> Self {
        self.request.data = data.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Sets how the response body is decoded.
    #[must_use]
    pub const fn response_type(mut self, response_type: ResponseType) -> Self {
        self.request.response_type = response_type;
        self
    }

    /// Appends request transformers.
    #[must_use]
    pub fn transform_request(mut self, transformers: impl IntoIterator<Item = RequestTransformer>) -> Self {
        self.request.transform_request.extend(transformers);
        self
    }

    /// Appends response transformers.
    #[must_use]
    pub fn transform_response(
        mut self,
        transformers: impl IntoIterator<Item = ResponseTransformer>,
    ) -> Self {
        self.request.transform_response.extend(transformers);
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        self.request
    }
}
