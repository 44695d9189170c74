//! Positional argument values handed to a service method.

use bytes::Bytes;
use serde_json::Value;

use crate::PartDescriptor;

/// One positional argument of a method invocation.
///
/// Arguments are dynamic: any JSON value, or a part descriptor for multipart
/// uploads carrying binary content.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A JSON value (scalar, array, object or null).
    Value(Value),
    /// A multipart part descriptor.
    Part(PartDescriptor),
}

static NULL_ARG: Arg = Arg::Value(Value::Null);

impl Arg {
    /// The argument at `index`, or null when the caller passed fewer arguments.
    #[must_use]
    pub fn at(args: &[Self], index: usize) -> &Self {
        args.get(index).unwrap_or(&NULL_ARG)
    }

    /// The JSON value, if this is not a part descriptor.
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Part(_) => None,
        }
    }

    /// Returns `true` for a null (or missing) argument.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// A JSON rendition of this argument.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Part(part) => part.to_value(),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<PartDescriptor> for Arg {
    fn from(part: PartDescriptor) -> Self {
        Self::Part(part)
    }
}

impl From<Bytes> for Arg {
    fn from(data: Bytes) -> Self {
        Self::Part(PartDescriptor::binary(data))
    }
}

macro_rules! arg_from_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

arg_from_json!(&str, String, bool, i32, i64, u32, u64, f64);

/// Build an argument list from heterogeneous values.
///
/// ```
/// use rigging_core::{args, Arg};
///
/// let args: Vec<Arg> = args![1, "hello", serde_json::json!({"a": true})];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        vec![$($crate::Arg::from($arg)),*]
    };
}

/// Render a JSON scalar as a string.
///
/// Returns `None` for null, arrays and objects.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A query parameter value: one scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// A single value.
    Single(String),
    /// A list of values, encoded according to the array format.
    List(Vec<String>),
}

impl QueryValue {
    /// Convert a JSON value, accepting scalars and arrays of scalars.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(scalar_to_string)
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            other => scalar_to_string(other).map(Self::Single),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}
