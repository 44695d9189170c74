//! Error types for rigging.

use derive_more::{Display, Error, From};

use crate::{Headers, Violation};

// ============================================================================
// Binding Errors
// ============================================================================

/// A method argument could not be bound to its request component.
///
/// Raised while resolving headers, query, fields and parts, before anything is
/// sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Error)]
pub enum BindingError {
    /// A header binding has an empty name.
    #[display("header key can't be empty")]
    EmptyHeaderKey,
    /// A header argument is not a string, number or boolean.
    #[display("header value must be a string, a number or a boolean")]
    WrongHeaderType,
    /// An entry of a header map is not a string, number or boolean.
    #[display("header map values must be strings, numbers or booleans")]
    WrongHeadersPropertyType,
    /// A query binding has an empty name.
    #[display("query key can't be empty")]
    EmptyQueryKey,
    /// A query argument is not a scalar or a list of scalars.
    #[display("query value must be a string, a number, a boolean or a list of those")]
    WrongQueryType,
    /// An entry of a query map is not a scalar or a list of scalars.
    #[display("query map values must be strings, numbers, booleans or lists of those")]
    WrongQueryMapPropertyType,
    /// A field binding (or a field map entry) has an empty name.
    #[display("field key can't be empty")]
    EmptyFieldKey,
    /// The field map argument is not a plain object.
    #[display("field map must be an object")]
    FieldMapParamType,
    /// A field binding is combined with an array body.
    #[display("fields can't be combined with an array body")]
    FieldWithArrayBody,
    /// A field map is combined with an array body.
    #[display("a field map can't be combined with an array body")]
    FieldMapForArrayBody,
    /// A part binding has an empty name.
    #[display("part key can't be empty")]
    EmptyPartKey,
    /// A multipart entry is not a part descriptor.
    #[display("multipart values must be part descriptors")]
    MultipartParamWrongType,
    /// A part binding is combined with an array body.
    #[display("parts can't be combined with an array body")]
    MultipartWithArrayBody,
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for rigging operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response headers.
        headers: Headers,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// An argument could not be bound to the request.
    #[display("binding error: {_0}")]
    #[from]
    Binding(BindingError),

    /// The service has no metadata for the invoked method.
    #[display("method `{_0}` does not exist")]
    #[from(skip)]
    MethodNotFound(#[error(not(source))] String),

    /// The invoked method was declared without an HTTP verb.
    #[display("method `{_0}` has no HTTP method")]
    #[from(skip)]
    NoHttpMethod(#[error(not(source))] String),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "user.address.city").
        path: String,
        /// Error message.
        message: String,
    },

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// Response validation was requested on data that is neither an object nor an array.
    #[display("validation requires an object or an array, got: {_0}")]
    #[from(skip)]
    ValidationNotObject(#[error(not(source))] String),

    /// Converted response data failed validation.
    #[display("validation failed with {} violation(s) on {payload}", violations.len())]
    #[from(skip)]
    Validation {
        /// Serialized payload that failed validation.
        payload: String,
        /// Every violation found, not only the first.
        #[error(not(source))]
        violations: Vec<Violation>,
    },

    /// The request history is empty (or disabled).
    #[display("no requests in history")]
    #[from(skip)]
    NoRequestsInHistory,
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Create an HTTP error carrying the response headers and body.
    #[must_use]
    pub fn http_with_response(
        status: u16,
        message: impl Into<String>,
        headers: Headers,
        body: bytes::Bytes,
    ) -> Self {
        Self::Http {
            status,
            message: message.into(),
            headers,
            body: Some(body),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// The binding error kind, if argument binding failed.
    #[must_use]
    pub const fn binding(&self) -> Option<BindingError> {
        match self {
            Self::Binding(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns `true` if the call failed before dispatch because of a binding.
    #[must_use]
    pub const fn is_binding(&self) -> bool {
        matches!(self, Self::Binding(_))
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&bytes::Bytes> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Returns the validation violations, empty for any other error.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Try to decode the HTTP error body as JSON.
    ///
    /// Returns `None` if there is no body or this is not an HTTP error.
    pub fn decode_body<T: serde::de::DeserializeOwned>(&self) -> Option<Result<T>> {
        self.body().map(|body| crate::from_json(body))
    }
}
