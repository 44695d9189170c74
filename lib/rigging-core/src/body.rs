//! Request bodies, content-type dispatch and serialization helpers.

use bytes::Bytes;
use serde_json::Value;

use crate::{Form, Result};

/// Content type families understood by the data resolvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Multipart content type (`multipart/form-data`).
    Multipart,
    /// JSON content type (`application/json`).
    Json,
    /// XML text (`text/xml`).
    TextXml,
    /// HTML text (`text/html`).
    TextHtml,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Families in dispatch order: the first one contained in a header value wins.
    const DISPATCH_ORDER: [Self; 7] = [
        Self::FormUrlEncoded,
        Self::Multipart,
        Self::Json,
        Self::TextXml,
        Self::TextHtml,
        Self::PlainText,
        Self::OctetStream,
    ];

    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::Multipart => "multipart/form-data",
            Self::Json => "application/json",
            Self::TextXml => "text/xml",
            Self::TextHtml => "text/html",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }

    /// Classify a `Content-Type` header value.
    ///
    /// Matching is a case-insensitive substring test, so parameters such as
    /// `;charset=utf-8` or a multipart boundary do not matter. Unknown values
    /// fall back to JSON.
    #[must_use]
    pub fn detect(header: &str) -> Self {
        let header = header.to_ascii_lowercase();
        Self::DISPATCH_ORDER
            .into_iter()
            .find(|candidate| header.contains(candidate.as_str()))
            .unwrap_or(Self::Json)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request data, as produced by a data resolver and seen by request transformers.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A JSON document, serialized when the request is sent.
    Json(Value),
    /// Text sent as-is.
    Text(String),
    /// Raw bytes sent as-is.
    Binary(Bytes),
    /// A multipart form, encoded when the request is sent.
    Multipart(Form),
}

impl Body {
    /// Returns `true` if there is no body.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The JSON document, if this is a JSON body.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The text, if this is a text body.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Wire bytes for this body.
    pub fn to_bytes(&self) -> Result<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Json(value) => to_json(value),
            Self::Text(text) => Ok(Bytes::from(text.clone())),
            Self::Binary(data) => Ok(data.clone()),
            Self::Multipart(form) => Ok(form.clone().into_body().1),
        }
    }

    /// Short human-readable rendition for logs.
    #[must_use]
    pub fn preview(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Json(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::Binary(data) => format!("<{} bytes>", data.len()),
            Self::Multipart(form) => {
                let names = form.parts().iter().map(crate::Part::name).collect::<Vec<_>>();
                format!("<multipart: {}>", names.join(", "))
            }
        }
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self::Binary(data)
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use rigging_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded text.
///
/// # Example
///
/// ```
/// use rigging_core::to_form;
///
/// let pairs = vec![("username", "alice"), ("note", "a b")];
/// assert_eq!(to_form(&pairs).expect("serialize"), "username=alice&note=a+b");
/// ```
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_urlencoded::to_string(value).map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

/// Deserialize an in-memory JSON value with path-aware error messages.
pub fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}
