//! Response pipeline: decode, transform, convert, validate, then inline or not.

use bytes::Bytes;
use serde_json::Value;

use crate::transform::parse;
use crate::{ConvertTo, Error, MethodMetadata, Reply, Response, Result, Violation};

/// Service-level switches of the response pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Validate converted data.
    pub validate: bool,
    /// Return only the response data.
    pub inline: bool,
}

/// Decode a successful response and run it through the pipeline stages.
///
/// The default parse step decodes the body according to the originating
/// request's response type, then the request's response transformers run in
/// order. A declared conversion maps the data (each element of an array) into
/// the target type; validation collects violations across all elements and
/// fails once with all of them.
pub fn process_response(
    response: Response<Bytes>,
    metadata: &MethodMetadata,
    options: PipelineOptions,
) -> Result<Reply> {
    let response = decode(response)?;
    let response = match metadata.convert_to() {
        Some(convert_to) => response.try_map_body(|data| convert(convert_to, data, options.validate))?,
        None => response,
    };

    Ok(if options.inline {
        Reply::Inline(response.into_body())
    } else {
        Reply::Full(response)
    })
}

/// Default parse step followed by the response transformers.
pub fn decode(response: Response<Bytes>) -> Result<Response<Value>> {
    let (response_type, transformers) = response
        .request()
        .map(|request| (request.response_type(), request.response_transformers().to_vec()))
        .unwrap_or_default();

    let headers = response.headers().clone();
    response.try_map_body(|body| {
        let mut data = parse(&body, response_type);
        for transformer in &transformers {
            data = transformer(data, &headers)?;
        }
        tracing::debug!(transformers = transformers.len(), "decoded response data");
        Ok(data)
    })
}

fn convert(convert_to: &ConvertTo, data: Value, validate: bool) -> Result<Value> {
    let mut violations = Vec::new();
    let converted = match data {
        Value::Array(items) => {
            let mut converted = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let item = convert_to.apply(item, validate)?;
                let parent = format!("[{index}]");
                violations.extend(item.violations.into_iter().map(|v| v.nested_in(&parent)));
                converted.push(item.value);
            }
            Value::Array(converted)
        }
        object @ Value::Object(_) => {
            let item = convert_to.apply(object, validate)?;
            violations.extend(item.violations);
            item.value
        }
        other if validate => {
            let rendered = other.as_str().map_or_else(|| other.to_string(), str::to_string);
            return Err(Error::ValidationNotObject(rendered));
        }
        other => other,
    };

    if violations.is_empty() {
        Ok(converted)
    } else {
        Err(validation_error(&converted, violations))
    }
}

fn validation_error(payload: &Value, violations: Vec<Violation>) -> Error {
    tracing::debug!(count = violations.len(), "response validation failed");
    Error::Validation {
        payload: payload.to_string(),
        violations,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{Headers, Method, Request, ResponseType, Validate};

    #[derive(serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Post {
        user_id: i64,
        title: String,
        #[serde(default)]
        body: String,
    }

    impl Validate for Post {
        fn validate(&self) -> Vec<Violation> {
            let mut violations = Vec::new();
            if self.user_id >= 0 {
                violations.push(Violation::new("userId", "must be negative"));
            }
            if self.body.len() < 5 {
                violations.push(Violation::new("body", "must have at least 5 characters"));
            }
            violations
        }
    }

    fn response(body: &'static str, metadata: &MethodMetadata) -> Response<Bytes> {
        let request = Request::builder(Method::Get, "http://localhost/posts")
            .response_type(metadata.response_type.unwrap_or_default())
            .transform_response(metadata.response_transformers.iter().cloned())
            .build();
        Response::new(200, Headers::new(), Bytes::from_static(body.as_bytes()))
            .with_request(Arc::new(request))
    }

    fn posts_metadata() -> MethodMetadata {
        MethodMetadata::builder(Method::Get, "/posts")
            .convert_to(ConvertTo::of::<Post>())
            .build()
    }

    #[test]
    fn inline_equals_full_data() {
        let metadata = MethodMetadata::builder(Method::Get, "/posts").build();
        let body = r#"{"id":1,"title":"hello"}"#;

        let inline = process_response(
            response(body, &metadata),
            &metadata,
            PipelineOptions { inline: true, ..PipelineOptions::default() },
        )
        .expect("inline");
        let full = process_response(response(body, &metadata), &metadata, PipelineOptions::default())
            .expect("full");

        assert!(matches!(inline, Reply::Inline(_)));
        assert!(full.response().is_some());
        assert_eq!(inline.data(), full.data());
    }

    #[test]
    fn transformers_run_in_order_after_parse() {
        let metadata = MethodMetadata::builder(Method::Get, "/posts")
            .response_transformer(|mut data, _headers| {
                data["step"] = json!("first");
                Ok(data)
            })
            .response_transformer(|mut data, _headers| {
                let first = data["step"].clone();
                data["step"] = json!([first, "second"]);
                Ok(data)
            })
            .build();

        let reply = process_response(response(r#"{"id":1}"#, &metadata), &metadata, PipelineOptions::default())
            .expect("reply");
        assert_eq!(reply.data(), &json!({"id": 1, "step": ["first", "second"]}));
    }

    #[test]
    fn text_response_type_keeps_raw_body() {
        let metadata = MethodMetadata::builder(Method::Get, "/raw")
            .response_type(ResponseType::Text)
            .build();
        let reply = process_response(response(r#"{"a":1}"#, &metadata), &metadata, PipelineOptions::default())
            .expect("reply");
        assert_eq!(reply.data(), &json!(r#"{"a":1}"#));
    }

    #[test]
    fn convert_maps_every_array_element() {
        let metadata = posts_metadata();
        let body = r#"[{"userId":1,"title":"a","extra":1},{"userId":2,"title":"b"}]"#;
        let reply = process_response(response(body, &metadata), &metadata, PipelineOptions::default())
            .expect("reply");
        assert_eq!(
            reply.data(),
            &json!([
                {"userId": 1, "title": "a", "body": ""},
                {"userId": 2, "title": "b", "body": ""}
            ])
        );
    }

    #[test]
    fn validation_aggregates_all_violations() {
        let metadata = posts_metadata();
        let body = r#"[{"userId":-1,"title":"a","body":"long enough"},{"userId":2,"title":"b","body":"x"}]"#;
        let options = PipelineOptions { validate: true, ..PipelineOptions::default() };

        let err = process_response(response(body, &metadata), &metadata, options).expect_err("invalid");

        assert_eq!(
            err.violations(),
            &[
                Violation::new("[1].userId", "must be negative"),
                Violation::new("[1].body", "must have at least 5 characters"),
            ]
        );
        let Error::Validation { payload, .. } = err else {
            panic!("expected a validation error");
        };
        assert!(payload.contains("long enough"));
    }

    #[test]
    fn validation_reports_structural_failures_of_every_element() {
        let metadata = posts_metadata();
        let body = r#"[{"userId":"one","title":"a"},{"userId":2},{"userId":-3,"title":"c","body":"long enough"}]"#;
        let options = PipelineOptions { validate: true, ..PipelineOptions::default() };

        let err = process_response(response(body, &metadata), &metadata, options).expect_err("invalid");

        let paths: Vec<_> = err.violations().iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["[0].userId", "[1]"]);
        assert!(err.violations()[0].message.contains("invalid type"));
        assert!(err.violations()[1].message.contains("missing field `title`"));
        let Error::Validation { payload, .. } = err else {
            panic!("expected a validation error");
        };
        assert!(payload.contains(r#""userId":"one""#));
    }

    #[test]
    fn structural_failure_without_validation_is_a_deserialization_error() {
        let metadata = posts_metadata();
        let body = r#"[{"userId":1,"title":"a"},{"userId":"two"}]"#;

        let err = process_response(response(body, &metadata), &metadata, PipelineOptions::default())
            .expect_err("invalid");

        assert!(matches!(err, Error::JsonDeserialization { ref path, .. } if path == "userId"));
    }

    #[test]
    fn validation_requires_object_or_array() {
        let metadata = posts_metadata();
        let options = PipelineOptions { validate: true, ..PipelineOptions::default() };

        let err = process_response(response("just text", &metadata), &metadata, options)
            .expect_err("not an object");

        assert!(matches!(err, Error::ValidationNotObject(data) if data == "just text"));
    }

    #[test]
    fn scalar_data_skips_conversion_without_validation() {
        let metadata = posts_metadata();
        let reply = process_response(response("42", &metadata), &metadata, PipelineOptions::default())
            .expect("reply");
        assert_eq!(reply.data(), &json!(42));
    }
}
