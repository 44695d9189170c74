use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{Arg, BindingError, Error, MethodMetadata, PartDescriptor, Result};

/// The raw body payload of a call, before content-type serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// Nothing bound.
    #[default]
    Empty,
    /// Named entries from an object body, fields, field map or parts.
    Object(IndexMap<String, Arg>),
    /// An explicit array body.
    Array(Vec<Value>),
    /// An explicit scalar body (string, number or boolean).
    Scalar(Value),
}

impl Payload {
    /// Insert a named entry; fails with `conflict` when the payload is an array or scalar.
    fn insert(&mut self, name: String, value: Arg, conflict: BindingError) -> Result<()> {
        match self {
            Self::Empty => {
                *self = Self::Object(IndexMap::from([(name, value)]));
                Ok(())
            }
            Self::Object(entries) => {
                entries.insert(name, value);
                Ok(())
            }
            Self::Array(_) | Self::Scalar(_) => Err(conflict.into()),
        }
    }

    const fn is_replaced(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Scalar(_))
    }

    /// JSON rendition of the whole payload; `null` when empty.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(name, value)| (name, value.to_value()))
                    .collect::<Map<_, _>>(),
            ),
            Self::Array(items) => Value::Array(items),
            Self::Scalar(value) => value,
        }
    }
}

/// Resolve the body payload of a call.
///
/// Sources are applied in a fixed order: the explicit body (an object is
/// merged, an array or scalar replaces the payload), the GraphQL operation,
/// bound fields, the field map, then bound parts. Named sources conflict with
/// a replaced payload.
pub fn resolve_body(metadata: &MethodMetadata, args: &[Arg]) -> Result<Payload> {
    let mut payload = Payload::Empty;

    if let Some(index) = metadata.body_index {
        match Arg::at(args, index) {
            Arg::Value(Value::Null) => {}
            Arg::Value(Value::Object(map)) => {
                for (name, value) in map {
                    payload.insert(
                        name.clone(),
                        Arg::Value(value.clone()),
                        BindingError::FieldWithArrayBody,
                    )?;
                }
            }
            Arg::Value(Value::Array(items)) => payload = Payload::Array(items.clone()),
            Arg::Value(scalar) => payload = Payload::Scalar(scalar.clone()),
            Arg::Part(_) => {
                return Err(Error::invalid_request(
                    "a part descriptor can't be used as the request body",
                ));
            }
        }
    }

    if let Some(graphql) = &metadata.graphql {
        let conflict = BindingError::FieldWithArrayBody;
        payload.insert("query".into(), Arg::from(graphql.query.as_str()), conflict)?;
        if let Some(operation_name) = &graphql.operation_name {
            payload.insert("operationName".into(), Arg::from(operation_name.as_str()), conflict)?;
        }
        if let Some(index) = metadata.graphql_variables_index {
            let variables = Arg::at(args, index);
            if !variables.is_null() {
                payload.insert("variables".into(), variables.clone(), conflict)?;
            }
        }
    }

    for (&index, name) in &metadata.fields {
        if name.is_empty() {
            return Err(BindingError::EmptyFieldKey.into());
        }
        payload.insert(
            name.clone(),
            Arg::at(args, index).clone(),
            BindingError::FieldWithArrayBody,
        )?;
    }

    if let Some(index) = metadata.field_map_index {
        if payload.is_replaced() {
            return Err(BindingError::FieldMapForArrayBody.into());
        }
        match Arg::at(args, index) {
            Arg::Value(Value::Null) => {}
            Arg::Value(Value::Object(map)) => {
                for (name, value) in map {
                    if name.is_empty() {
                        return Err(BindingError::EmptyFieldKey.into());
                    }
                    payload.insert(
                        name.clone(),
                        Arg::Value(value.clone()),
                        BindingError::FieldMapForArrayBody,
                    )?;
                }
            }
            _ => return Err(BindingError::FieldMapParamType.into()),
        }
    }

    for (&index, name) in &metadata.parts {
        if name.is_empty() {
            return Err(BindingError::EmptyPartKey.into());
        }
        if payload.is_replaced() {
            return Err(BindingError::MultipartWithArrayBody.into());
        }
        let part = match Arg::at(args, index) {
            Arg::Part(part) => part.clone(),
            Arg::Value(value) => PartDescriptor::try_from(value)?,
        };
        payload.insert(
            name.clone(),
            Arg::Part(part),
            BindingError::MultipartWithArrayBody,
        )?;
    }

    Ok(payload)
}
