use serde_json::Value;

use crate::value::scalar_to_string;
use crate::{Arg, BindingError, Headers, MethodMetadata, Result};

/// Resolve the headers of a call.
///
/// Sources are overlaid from lowest to highest precedence: static headers,
/// argument-bound headers, then the header map argument. A later source wins
/// on a name collision.
pub fn resolve_headers(metadata: &MethodMetadata, args: &[Arg]) -> Result<Headers> {
    let mut headers = Headers::new();

    for (name, value) in &metadata.headers {
        let value = scalar_to_string(value).ok_or(BindingError::WrongHeaderType)?;
        headers.insert(name.clone(), value);
    }

    for (&index, name) in &metadata.header_params {
        if name.is_empty() {
            return Err(BindingError::EmptyHeaderKey.into());
        }
        let value = Arg::at(args, index)
            .as_value()
            .and_then(scalar_to_string)
            .ok_or(BindingError::WrongHeaderType)?;
        headers.insert(name.clone(), value);
    }

    if let Some(index) = metadata.header_map_index {
        match Arg::at(args, index) {
            Arg::Value(Value::Null) => {}
            Arg::Value(Value::Object(map)) => {
                for (name, value) in map {
                    if name.is_empty() {
                        return Err(BindingError::EmptyHeaderKey.into());
                    }
                    let value =
                        scalar_to_string(value).ok_or(BindingError::WrongHeadersPropertyType)?;
                    headers.insert(name.clone(), value);
                }
            }
            _ => return Err(BindingError::WrongHeadersPropertyType.into()),
        }
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;
    use crate::{Method, args};

    fn binding_error(result: Result<Headers>) -> Option<BindingError> {
        result.err().and_then(|err| err.binding())
    }

    #[test]
    fn overlay_precedence() {
        let metadata = MethodMetadata::builder(Method::Get, "/")
            .header("X-Source", "static")
            .header("X-Static", "kept")
            .header_param(0, "X-Source")
            .header_param(1, "X-Indexed")
            .header_map(2)
            .build();

        let headers = resolve_headers(
            &metadata,
            &args!["indexed", 3, json!({"x-indexed": true, "X-Map": "m"})],
        )
        .expect("headers");

        check!(headers.get("X-Source") == Some("indexed"));
        check!(headers.get("X-Static") == Some("kept"));
        check!(headers.get("X-Indexed") == Some("true"));
        check!(headers.get("X-Map") == Some("m"));
        check!(headers.content_type() == Some("application/json"));
    }

    #[test]
    fn numbers_and_booleans_are_stringified() {
        let metadata = MethodMetadata::builder(Method::Get, "/")
            .header_param(0, "X-Count")
            .header_param(1, "X-Flag")
            .build();
        let headers = resolve_headers(&metadata, &args![42, false]).expect("headers");
        check!(headers.get("X-Count") == Some("42"));
        check!(headers.get("X-Flag") == Some("false"));
    }

    #[test]
    fn empty_header_key() {
        let metadata = MethodMetadata::builder(Method::Get, "/").header_param(0, "").build();
        check!(binding_error(resolve_headers(&metadata, &args!["x"])) == Some(BindingError::EmptyHeaderKey));

        let metadata = MethodMetadata::builder(Method::Get, "/").header_map(0).build();
        check!(
            binding_error(resolve_headers(&metadata, &args![json!({"": "x"})]))
                == Some(BindingError::EmptyHeaderKey)
        );
    }

    #[test]
    fn wrong_header_type() {
        let metadata = MethodMetadata::builder(Method::Get, "/")
            .header_param(0, "X-Data")
            .build();
        check!(
            binding_error(resolve_headers(&metadata, &args![json!({"a": 1})]))
                == Some(BindingError::WrongHeaderType)
        );
        check!(binding_error(resolve_headers(&metadata, &[])) == Some(BindingError::WrongHeaderType));
    }

    #[test]
    fn wrong_headers_property_type() {
        let metadata = MethodMetadata::builder(Method::Get, "/").header_map(0).build();
        check!(
            binding_error(resolve_headers(&metadata, &args![json!({"X-A": [1, 2]})]))
                == Some(BindingError::WrongHeadersPropertyType)
        );
        check!(
            binding_error(resolve_headers(&metadata, &args![json!(["X-A"])]))
                == Some(BindingError::WrongHeadersPropertyType)
        );
    }

    #[test]
    fn null_header_map_is_ignored() {
        let metadata = MethodMetadata::builder(Method::Get, "/").header_map(0).build();
        let_assert!(Ok(headers) = resolve_headers(&metadata, &[]));
        check!(headers.len() == 1);
    }
}
