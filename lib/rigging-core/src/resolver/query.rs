use indexmap::IndexMap;
use serde_json::Value;

use crate::{Arg, BindingError, MethodMetadata, QueryValue, Result};

/// Resolve the query parameters of a call.
///
/// Same overlay as headers: static values, then argument-bound parameters,
/// then the query map argument. Values must be scalars or lists of scalars.
pub fn resolve_query(metadata: &MethodMetadata, args: &[Arg]) -> Result<IndexMap<String, QueryValue>> {
    let mut query = IndexMap::new();

    for (name, value) in &metadata.query {
        let value = QueryValue::from_json(value).ok_or(BindingError::WrongQueryType)?;
        query.insert(name.clone(), value);
    }

    for (&index, name) in &metadata.query_params {
        if name.is_empty() {
            return Err(BindingError::EmptyQueryKey.into());
        }
        let value = Arg::at(args, index)
            .as_value()
            .and_then(QueryValue::from_json)
            .ok_or(BindingError::WrongQueryType)?;
        query.insert(name.clone(), value);
    }

    if let Some(index) = metadata.query_map_index {
        match Arg::at(args, index) {
            Arg::Value(Value::Null) => {}
            Arg::Value(Value::Object(map)) => {
                for (name, value) in map {
                    if name.is_empty() {
                        return Err(BindingError::EmptyQueryKey.into());
                    }
                    let value = QueryValue::from_json(value)
                        .ok_or(BindingError::WrongQueryMapPropertyType)?;
                    query.insert(name.clone(), value);
                }
            }
            _ => return Err(BindingError::WrongQueryMapPropertyType.into()),
        }
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{Method, args};

    fn single(value: &str) -> QueryValue {
        QueryValue::Single(value.to_string())
    }

    #[test]
    fn overlay_precedence() {
        let metadata = MethodMetadata::builder(Method::Get, "/")
            .query("page", 1)
            .query("size", 10)
            .query_param(0, "page")
            .query_map(1)
            .build();

        let query = resolve_query(&metadata, &args![2, json!({"size": 50, "tags": ["a", "b"]})])
            .expect("query");

        assert_eq!(query.get("page"), Some(&single("2")));
        assert_eq!(query.get("size"), Some(&single("50")));
        assert_eq!(
            query.get("tags"),
            Some(&QueryValue::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(query.keys().collect::<Vec<_>>(), vec!["page", "size", "tags"]);
    }

    #[test]
    fn empty_query_key() {
        let metadata = MethodMetadata::builder(Method::Get, "/").query_param(0, "").build();
        let err = resolve_query(&metadata, &args!["x"]).expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::EmptyQueryKey));
    }

    #[test]
    fn wrong_query_type() {
        let metadata = MethodMetadata::builder(Method::Get, "/").query_param(0, "filter").build();
        let err = resolve_query(&metadata, &args![json!({"a": 1})]).expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::WrongQueryType));

        let metadata = MethodMetadata::builder(Method::Get, "/").query("bad", json!({"a": 1})).build();
        let err = resolve_query(&metadata, &[]).expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::WrongQueryType));
    }

    #[test]
    fn wrong_query_map_property_type() {
        let metadata = MethodMetadata::builder(Method::Get, "/").query_map(0).build();
        let err = resolve_query(&metadata, &args![json!({"a": {"b": 1}})]).expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::WrongQueryMapPropertyType));

        let err = resolve_query(&metadata, &args!["not a map"]).expect_err("should fail");
        assert_eq!(err.binding(), Some(BindingError::WrongQueryMapPropertyType));
    }
}
