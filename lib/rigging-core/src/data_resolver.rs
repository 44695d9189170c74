//! Content-type keyed serialization of the resolved payload into a request body.

use serde_json::Value;

use crate::value::scalar_to_string;
use crate::{Arg, BindingError, Body, ContentType, Form, Headers, Payload, PartDescriptor, Result};

/// Turns a resolved [`Payload`] into a request [`Body`].
pub trait DataResolver: Send + Sync {
    /// Serialize `payload` for a request carrying `headers`.
    fn resolve(&self, headers: &Headers, payload: Payload) -> Result<Body>;
}

/// Pick the resolver for a `Content-Type` header value.
///
/// See [`ContentType::detect`] for the matching rules.
#[must_use]
pub fn create_data_resolver(content_type: &str) -> &'static dyn DataResolver {
    match ContentType::detect(content_type) {
        ContentType::FormUrlEncoded => &FormUrlEncodedResolver,
        ContentType::Multipart => &MultipartResolver,
        ContentType::Json => &JsonResolver,
        ContentType::TextXml | ContentType::TextHtml | ContentType::PlainText | ContentType::OctetStream => {
            &TextResolver
        }
    }
}

/// Keeps the payload as a JSON document; a string body is sent as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonResolver;

impl DataResolver for JsonResolver {
    fn resolve(&self, _headers: &Headers, payload: Payload) -> Result<Body> {
        Ok(match payload {
            Payload::Empty => Body::Empty,
            Payload::Scalar(Value::String(text)) => Body::Text(text),
            other => Body::Json(other.into_value()),
        })
    }
}

/// Encodes entries as `application/x-www-form-urlencoded`.
///
/// Non-scalar values are JSON-encoded first, and `null` is written `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormUrlEncodedResolver;

fn form_value(value: &Value) -> String {
    scalar_to_string(value).unwrap_or_else(|| value.to_string())
}

impl DataResolver for FormUrlEncodedResolver {
    fn resolve(&self, _headers: &Headers, payload: Payload) -> Result<Body> {
        let pairs = match payload {
            Payload::Empty => return Ok(Body::Empty),
            Payload::Scalar(Value::String(text)) => return Ok(Body::Text(text)),
            Payload::Scalar(other) => return Ok(Body::Text(form_value(&other))),
            Payload::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), form_value(value)))
                .collect::<Vec<_>>(),
            Payload::Object(entries) => entries
                .into_iter()
                .map(|(name, value)| match value {
                    Arg::Value(value) => Ok((name, form_value(&value))),
                    Arg::Part(_) => Err(BindingError::MultipartParamWrongType),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };
        crate::to_form(&pairs).map(Body::Text)
    }
}

/// Builds a multipart form, one part per entry and one per list element.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipartResolver;

impl DataResolver for MultipartResolver {
    fn resolve(&self, _headers: &Headers, payload: Payload) -> Result<Body> {
        let mut form = Form::new();
        match payload {
            Payload::Empty => {}
            Payload::Array(_) | Payload::Scalar(_) => {
                return Err(BindingError::MultipartParamWrongType.into());
            }
            Payload::Object(entries) => {
                for (name, value) in entries {
                    let descriptor = match value {
                        Arg::Part(part) => part,
                        Arg::Value(value) => PartDescriptor::try_from(&value)?,
                    };
                    for part in descriptor.into_parts(&name)? {
                        form.push(part);
                    }
                }
            }
        }
        Ok(Body::Multipart(form))
    }
}

/// Pass-through for text/XML/HTML content: strings are sent as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResolver;

impl DataResolver for TextResolver {
    fn resolve(&self, _headers: &Headers, payload: Payload) -> Result<Body> {
        Ok(match payload {
            Payload::Empty => Body::Empty,
            Payload::Scalar(Value::String(text)) => Body::Text(text),
            other => Body::Json(other.into_value()),
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;

    fn object(entries: Vec<(&str, Arg)>) -> Payload {
        Payload::Object(
            entries
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect::<IndexMap<_, _>>(),
        )
    }

    fn form_text(body: Body) -> String {
        body.as_text().expect("text body").to_string()
    }

    #[test]
    fn dispatch_by_content_type() {
        let headers = Headers::new();
        let payload = || object(vec![("a", Arg::from(1))]);

        let body = create_data_resolver("application/x-www-form-urlencoded;charset=utf-8")
            .resolve(&headers, payload())
            .expect("form");
        assert_eq!(form_text(body), "a=1");

        let body = create_data_resolver("application/vnd.unknown")
            .resolve(&headers, payload())
            .expect("json");
        assert_eq!(body, Body::Json(json!({"a": 1})));
    }

    #[test]
    fn form_encodes_scalars() {
        let payload = object(vec![("a", Arg::from(1)), ("b", Arg::from("x")), ("c", Arg::from(true))]);
        let body = FormUrlEncodedResolver.resolve(&Headers::new(), payload).expect("form");
        assert_eq!(form_text(body), "a=1&b=x&c=true");
    }

    #[test]
    fn form_json_encodes_nested_values() {
        let payload = object(vec![
            ("a", Arg::from(1)),
            ("b", Arg::from("hello")),
            ("c", Arg::from(true)),
            ("d", Arg::Value(Value::Null)),
            ("e", Arg::Value(json!(["foo", "bar"]))),
        ]);
        let body = FormUrlEncodedResolver.resolve(&Headers::new(), payload).expect("form");
        assert_eq!(
            form_text(body),
            "a=1&b=hello&c=true&d=null&e=%5B%22foo%22%2C%22bar%22%5D"
        );
    }

    #[test]
    fn form_rejects_part_descriptors() {
        let payload = object(vec![("file", Arg::Part(PartDescriptor::text("x")))]);
        let err = FormUrlEncodedResolver
            .resolve(&Headers::new(), payload)
            .expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::MultipartParamWrongType));
    }

    #[test]
    fn multipart_builds_one_part_per_entry() {
        let payload = object(vec![
            ("bucket", Arg::Value(json!({"value": "x"}))),
            (
                "file",
                Arg::Part(PartDescriptor::binary(vec![0x89_u8, 0x50]).with_filename("f.png")),
            ),
        ]);
        let Body::Multipart(form) = MultipartResolver.resolve(&Headers::new(), payload).expect("multipart") else {
            panic!("expected a multipart body");
        };

        let parts = form.parts();
        assert_eq!(parts.len(), 2);
        let bucket = parts.first().expect("bucket part");
        assert_eq!(bucket.name(), "bucket");
        assert_eq!(bucket.data().as_ref(), b"x");
        assert_eq!(bucket.filename(), None);
        let file = parts.get(1).expect("file part");
        assert_eq!(file.filename(), Some("f.png"));
        assert_eq!(file.content_type(), Some("image/png"));
    }

    #[test]
    fn multipart_appends_list_elements_under_same_name() {
        let payload = object(vec![("tags", Arg::Value(json!({"value": ["a", "b"]})))]);
        let Body::Multipart(form) = MultipartResolver.resolve(&Headers::new(), payload).expect("multipart") else {
            panic!("expected a multipart body");
        };
        let names = form.parts().iter().map(crate::Part::name).collect::<Vec<_>>();
        assert_eq!(names, vec!["tags", "tags"]);
    }

    #[test]
    fn multipart_rejects_plain_values() {
        let payload = object(vec![("bucket", Arg::from("x"))]);
        let err = MultipartResolver
            .resolve(&Headers::new(), payload)
            .expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::MultipartParamWrongType));

        let err = MultipartResolver
            .resolve(&Headers::new(), Payload::Array(vec![json!(1)]))
            .expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::MultipartParamWrongType));
    }

    #[test]
    fn text_passes_through() {
        let body = TextResolver
            .resolve(&Headers::new(), Payload::Scalar(json!("<a/>")))
            .expect("text");
        assert_eq!(body, Body::Text("<a/>".into()));
    }

    #[test]
    fn json_keeps_structure() {
        let payload = object(vec![("nested", Arg::Value(json!({"value": "v"})))]);
        let body = JsonResolver.resolve(&Headers::new(), payload).expect("json");
        assert_eq!(body, Body::Json(json!({"nested": {"value": "v"}})));

        let body = JsonResolver
            .resolve(&Headers::new(), Payload::Array(vec![json!(1)]))
            .expect("json");
        assert_eq!(body, Body::Json(json!([1])));

        let body = JsonResolver
            .resolve(&Headers::new(), Payload::Scalar(json!("raw")))
            .expect("json");
        assert_eq!(body, Body::Text("raw".into()));
    }
}
