//! Multipart form data: part descriptors bound from arguments and the wire encoder.
//!
//! A [`PartDescriptor`] is what a caller hands to a part binding: a text,
//! binary or list value with an optional filename and content type. The
//! multipart data resolver flattens descriptors into [`Part`]s of a [`Form`],
//! which encodes itself as a `multipart/form-data` body.
//!
//! # Example
//!
//! ```
//! use rigging_core::{Form, Part};
//!
//! let form = Form::with_boundary("xyz")
//!     .part(Part::text("name", "John Doe"))
//!     .part(Part::new("avatar", vec![1_u8, 2, 3]).with_filename("photo.jpg"));
//!
//! let (content_type, _body) = form.into_body();
//! assert_eq!(content_type, "multipart/form-data; boundary=xyz");
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde_json::{Map, Value};

use crate::BindingError;
use crate::value::scalar_to_string;

// ============================================================================
// Part descriptors
// ============================================================================

/// Content of a part descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    /// Text content.
    Text(String),
    /// Binary content.
    Binary(Bytes),
    /// Several parts sent under the same name.
    List(Vec<PartDescriptor>),
}

/// A value bound to a multipart part, with optional filename and content type.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDescriptor {
    value: PartValue,
    filename: Option<String>,
    content_type: Option<String>,
}

impl PartDescriptor {
    /// A text part.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::from_value(PartValue::Text(value.into()))
    }

    /// A binary part.
    #[must_use]
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::from_value(PartValue::Binary(data.into()))
    }

    /// Several values sent under the same part name.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::from_value(PartValue::List(items.into_iter().collect()))
    }

    const fn from_value(value: PartValue) -> Self {
        Self {
            value,
            filename: None,
            content_type: None,
        }
    }

    /// Set the filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// The part content.
    #[must_use]
    pub const fn value(&self) -> &PartValue {
        &self.value
    }

    /// The filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// JSON rendition, used when a descriptor ends up in a non-multipart body.
    ///
    /// Binary content is rendered as an array of byte values.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let value = match &self.value {
            PartValue::Text(text) => Value::String(text.clone()),
            PartValue::Binary(data) => data.iter().copied().map(Value::from).collect(),
            PartValue::List(items) => items.iter().map(Self::to_value).collect(),
        };
        let mut object = Map::new();
        object.insert("value".to_string(), value);
        if let Some(filename) = &self.filename {
            object.insert("filename".to_string(), Value::String(filename.clone()));
        }
        if let Some(content_type) = &self.content_type {
            object.insert("contentType".to_string(), Value::String(content_type.clone()));
        }
        Value::Object(object)
    }

    /// Flatten into wire parts named `name`.
    ///
    /// List elements inherit the filename and content type of the list when
    /// they do not carry their own. Nested lists are rejected.
    pub(crate) fn into_parts(self, name: &str) -> Result<Vec<Part>, BindingError> {
        let Self {
            value,
            filename,
            content_type,
        } = self;
        match value {
            PartValue::List(items) => items
                .into_iter()
                .map(|item| {
                    let item = Self {
                        filename: item.filename.or_else(|| filename.clone()),
                        content_type: item.content_type.or_else(|| content_type.clone()),
                        value: item.value,
                    };
                    item.into_part(name)
                })
                .collect(),
            value => Self {
                value,
                filename,
                content_type,
            }
            .into_part(name)
            .map(|part| vec![part]),
        }
    }

    fn into_part(self, name: &str) -> Result<Part, BindingError> {
        let mut part = match self.value {
            PartValue::Text(text) => Part::new(name, text),
            PartValue::Binary(data) => Part::new(name, data),
            PartValue::List(_) => return Err(BindingError::MultipartParamWrongType),
        };
        part.filename = self.filename;
        part.content_type = self
            .content_type
            .or_else(|| part.filename.as_deref().map(guess_content_type));
        Ok(part)
    }
}

/// Read a descriptor from its JSON form: `{"value": ..., "filename"?, "contentType"?}`.
///
/// `value` may be a scalar or an array of scalars or nested descriptors.
impl TryFrom<&Value> for PartDescriptor {
    type Error = BindingError;

    fn try_from(json: &Value) -> Result<Self, Self::Error> {
        let Value::Object(object) = json else {
            return Err(BindingError::MultipartParamWrongType);
        };
        let value = object
            .get("value")
            .ok_or(BindingError::MultipartParamWrongType)?;
        let value = match value {
            Value::Array(items) => PartValue::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(_) => Self::try_from(item),
                        scalar => scalar_to_string(scalar)
                            .map(Self::text)
                            .ok_or(BindingError::MultipartParamWrongType),
                    })
                    .collect::<Result<_, _>>()?,
            ),
            scalar => PartValue::Text(
                scalar_to_string(scalar).ok_or(BindingError::MultipartParamWrongType)?,
            ),
        };
        let text_field = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(Self {
            value,
            filename: text_field("filename"),
            content_type: text_field("contentType"),
        })
    }
}

// ============================================================================
// Wire parts
// ============================================================================

/// A single encoded part in a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Create a new part with the given name and data.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Create a text part with a `text/plain; charset=utf-8` content type.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, value.into()).with_content_type("text/plain; charset=utf-8")
    }

    /// Set the filename for this part.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type for this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Get the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Get the content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the part data.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

fn guess_content_type(filename: &str) -> String {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
    .to_string()
}

// ============================================================================
// Form
// ============================================================================

/// A multipart form containing multiple parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create a new empty form with a generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Create a new form with a custom boundary.
    ///
    /// The boundary should be a unique string that doesn't appear in any part data.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Add a part to the form.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub(crate) fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Get the boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Get the parts in this form.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Returns `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Convert the form into `(content-type header value, body bytes)`.
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let content_type = self.content_type();
        let body = self.encode();
        (content_type, body)
    }

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        for part in &self.parts {
            buf.put_slice(b"--");
            buf.put_slice(self.boundary.as_bytes());
            buf.put_slice(b"\r\n");

            buf.put_slice(b"Content-Disposition: form-data; name=\"");
            buf.put_slice(part.name.as_bytes());
            buf.put_slice(b"\"");
            if let Some(filename) = &part.filename {
                buf.put_slice(b"; filename=\"");
                buf.put_slice(filename.as_bytes());
                buf.put_slice(b"\"");
            }
            buf.put_slice(b"\r\n");

            if let Some(content_type) = &part.content_type {
                buf.put_slice(b"Content-Type: ");
                buf.put_slice(content_type.as_bytes());
                buf.put_slice(b"\r\n");
            }

            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }

        buf.put_slice(b"--");
        buf.put_slice(self.boundary.as_bytes());
        buf.put_slice(b"--\r\n");

        buf.freeze()
    }
}

fn generate_boundary() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let sequence = COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("----RiggingBoundary{timestamp:x}{sequence:x}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn descriptor_from_json_scalar() {
        let part = PartDescriptor::try_from(&json!({"value": "hello", "filename": "a.txt"}))
            .expect("descriptor");
        assert_eq!(part.value(), &PartValue::Text("hello".into()));
        assert_eq!(part.filename(), Some("a.txt"));
        assert_eq!(part.content_type(), None);
    }

    #[test]
    fn descriptor_from_json_list() {
        let part = PartDescriptor::try_from(&json!({"value": ["a", 1]})).expect("descriptor");
        assert_eq!(
            part.value(),
            &PartValue::List(vec![PartDescriptor::text("a"), PartDescriptor::text("1")])
        );
    }

    #[test]
    fn descriptor_from_json_rejects_non_descriptors() {
        assert_eq!(
            PartDescriptor::try_from(&json!("plain")),
            Err(BindingError::MultipartParamWrongType)
        );
        assert_eq!(
            PartDescriptor::try_from(&json!({"filename": "a.txt"})),
            Err(BindingError::MultipartParamWrongType)
        );
        assert_eq!(
            PartDescriptor::try_from(&json!({"value": {"nested": true}})),
            Err(BindingError::MultipartParamWrongType)
        );
    }

    #[test]
    fn list_elements_inherit_filename_and_content_type() {
        let descriptor = PartDescriptor::list([
            PartDescriptor::binary(vec![1_u8]),
            PartDescriptor::binary(vec![2_u8]).with_filename("two.bin"),
        ])
        .with_filename("shared.png");

        let parts = descriptor.into_parts("files").expect("parts");

        assert_eq!(parts.len(), 2);
        let first = parts.first().expect("first part");
        assert_eq!(first.name(), "files");
        assert_eq!(first.filename(), Some("shared.png"));
        assert_eq!(first.content_type(), Some("image/png"));
        let second = parts.get(1).expect("second part");
        assert_eq!(second.filename(), Some("two.bin"));
        assert_eq!(second.content_type(), Some("application/octet-stream"));
    }

    #[test]
    fn nested_lists_are_rejected() {
        let descriptor =
            PartDescriptor::list([PartDescriptor::list([PartDescriptor::text("deep")])]);
        assert_eq!(
            descriptor.into_parts("x"),
            Err(BindingError::MultipartParamWrongType)
        );
    }

    #[test]
    fn descriptor_to_value() {
        let descriptor = PartDescriptor::binary(vec![1_u8, 2])
            .with_filename("a.bin")
            .with_content_type("application/x-raw");
        assert_eq!(
            descriptor.to_value(),
            json!({"value": [1, 2], "filename": "a.bin", "contentType": "application/x-raw"})
        );
    }

    #[test]
    fn form_generated_boundaries_differ() {
        let first = Form::new();
        let second = Form::new();
        assert!(first.boundary().starts_with("----RiggingBoundary"));
        assert_ne!(first.boundary(), second.boundary());
    }

    #[test]
    fn form_encode() {
        let form = Form::with_boundary("boundary123")
            .part(Part::text("field", "value"))
            .part(Part::new("upload", "file content").with_filename("test.txt"));

        let (content_type, body) = form.into_body();

        assert_eq!(content_type, "multipart/form-data; boundary=boundary123");
        let rendered = String::from_utf8_lossy(&body).replace("\r\n", "\n");
        insta::assert_snapshot!(rendered.trim_end(), @r#"
        --boundary123
        Content-Disposition: form-data; name="field"
        Content-Type: text/plain; charset=utf-8

        value
        --boundary123
        Content-Disposition: form-data; name="upload"; filename="test.txt"

        file content
        --boundary123--
        "#);
    }

    #[test]
    fn guess_content_type_common() {
        assert_eq!(guess_content_type("photo.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("doc.pdf"), "application/pdf");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
        assert_eq!(guess_content_type("unknown.xyz"), "application/octet-stream");
    }
}
