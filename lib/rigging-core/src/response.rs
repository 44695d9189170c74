//! HTTP responses and call replies.
//!
//! The transport returns a [`Response<Bytes>`]; the response pipeline turns it
//! into a [`Response<Value>`] and finally a [`Reply`].

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::{Headers, Request};

/// HTTP response with status, headers, body and the request that produced it.
#[derive(Debug, Clone)]
pub struct Response<B = Bytes> {
    status: u16,
    headers: Headers,
    body: B,
    request: Option<Arc<Request>>,
}

impl<B> Response<B> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: Headers, body: B) -> Self {
        Self {
            status,
            headers,
            body,
            request: None,
        }
    }

    /// Attach the originating request.
    #[must_use]
    pub fn with_request(mut self, request: Arc<Request>) -> Self {
        self.request = Some(request);
        self
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Set the status code.
    pub const fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Response headers.
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

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// Mutable access to the body.
    pub const fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> B {
        self.body
    }

    /// The request that produced this response, when known.
    #[must_use]
    pub fn request(&self) -> Option<&Request> {
        self.request.as_deref()
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Transform the body with a function.
    pub fn map_body<F, B2>(self, f: F) -> Response<B2>
    where
        F: FnOnce(B) -> B2,
    {
        Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body),
            request: self.request,
        }
    }

    /// Transform the body with a fallible function.
    pub fn try_map_body<F, B2, E>(self, f: F) -> Result<Response<B2>, E>
    where
        F: FnOnce(B) -> Result<B2, E>,
    {
        Ok(Response {
            status: self.status,
            headers: self.headers,
            body: f(self.body)?,
            request: self.request,
        })
    }
}

impl Response<Bytes> {
    /// Deserialize the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_json(&self.body)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }
}

impl Response<Value> {
    /// Deserialize the decoded data into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> crate::Result<T> {
        crate::from_value(self.body.clone())
    }
}

/// What a service call returns.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Only the response data (the service inlines response bodies).
    Inline(Value),
    /// The full response.
    Full(Response<Value>),
}

impl Reply {
    /// The response data.
    #[must_use]
    pub const fn data(&self) -> &Value {
        match self {
            Self::Inline(data) => data,
            Self::Full(response) => response.body(),
        }
    }

    /// Consume into the response data.
    #[must_use]
    pub fn into_data(self) -> Value {
        match self {
            Self::Inline(data) => data,
            Self::Full(response) => response.into_body(),
        }
    }

    /// The full response, unless inlined.
    #[must_use]
    pub const fn response(&self) -> Option<&Response<Value>> {
        match self {
            Self::Inline(_) => None,
            Self::Full(response) => Some(response),
        }
    }

    /// Deserialize the response data into `T`.
    pub fn json<T: serde::de::DeserializeOwned>(self) -> crate::Result<T> {
        crate::from_value(self.into_data())
    }
}
