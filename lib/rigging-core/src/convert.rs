//! Typed conversion and validation of response data.

use std::fmt;

use derive_more::Display;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{path}: {message}")]
pub struct Violation {
    /// Path of the offending field (e.g. `[2].userId`).
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl Violation {
    /// Create a violation.
    #[must_use]
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Prefix the path, e.g. with the array index the value came from.
    #[must_use]
    pub fn nested_in(mut self, parent: &str) -> Self {
        self.path = if self.path.is_empty() {
            parent.to_string()
        } else if self.path.starts_with('[') {
            format!("{parent}{}", self.path)
        } else {
            format!("{parent}.{}", self.path)
        };
        self
    }
}

/// Structural validation of a converted value.
///
/// Implementations report every violation they find; the default accepts
/// everything.
pub trait Validate {
    /// All violations of this value.
    fn validate(&self) -> Vec<Violation> {
        Vec::new()
    }
}

/// Conversion target declared on a method.
///
/// Response data is mapped into `T` (per element for arrays) and rendered
/// back to JSON, so unknown fields are dropped and serde defaults applied.
#[derive(Clone, Copy)]
pub struct ConvertTo {
    type_name: &'static str,
    convert: fn(Value, bool) -> Result<Converted>,
}

/// A converted value with the violations found when validation was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    /// The converted value.
    pub value: Value,
    /// Violations, empty when validation was not requested.
    pub violations: Vec<Violation>,
}

impl ConvertTo {
    /// Convert into `T`.
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Serialize + Validate + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            convert: convert_one::<T>,
        }
    }

    /// Name of the target type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Convert a single (non-array) value, validating it if requested.
    ///
    /// With validation, a value that does not fit `T` is kept as-is and
    /// reported as a violation at the failing path.
    ///
    /// # Errors
    ///
    /// Without validation, a value that does not fit `T` fails with
    /// [`Error::JsonDeserialization`](crate::Error::JsonDeserialization).
    pub fn apply(&self, value: Value, validate: bool) -> Result<Converted> {
        (self.convert)(value, validate)
    }
}

impl fmt::Debug for ConvertTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConvertTo").field(&self.type_name).finish()
    }
}

fn convert_one<T>(value: Value, validate: bool) -> Result<Converted>
where
    T: DeserializeOwned + Serialize + Validate,
{
    if !validate {
        let typed: T = crate::from_value(value)?;
        let value = serde_json::to_value(&typed)?;
        return Ok(Converted {
            value,
            violations: Vec::new(),
        });
    }

    match serde_path_to_error::deserialize::<_, T>(&value) {
        Ok(typed) => Ok(Converted {
            violations: typed.validate(),
            value: serde_json::to_value(&typed)?,
        }),
        Err(err) => Ok(Converted {
            violations: vec![structural_violation(&err)],
            value,
        }),
    }
}

fn structural_violation(err: &serde_path_to_error::Error<serde_json::Error>) -> Violation {
    let path = err.path().to_string();
    let path = if path == "." { String::new() } else { path };
    Violation::new(path, err.inner().to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(serde::Serialize, serde::Deserialize)]
    struct Post {
        id: u32,
        title: String,
    }

    impl Validate for Post {
        fn validate(&self) -> Vec<Violation> {
            let mut violations = Vec::new();
            if self.title.len() < 3 {
                violations.push(Violation::new("title", "must have at least 3 characters"));
            }
            if self.id == 0 {
                violations.push(Violation::new("id", "must be positive"));
            }
            violations
        }
    }

    #[test]
    fn convert_drops_unknown_fields() {
        let converted = ConvertTo::of::<Post>()
            .apply(json!({"id": 1, "title": "hello", "extra": true}), false)
            .expect("convert");
        assert_eq!(converted.value, json!({"id": 1, "title": "hello"}));
        assert!(converted.violations.is_empty());
    }

    #[test]
    fn convert_collects_all_violations() {
        let converted = ConvertTo::of::<Post>()
            .apply(json!({"id": 0, "title": "x"}), true)
            .expect("convert");
        assert_eq!(
            converted.violations,
            vec![
                Violation::new("title", "must have at least 3 characters"),
                Violation::new("id", "must be positive"),
            ]
        );
    }

    #[test]
    fn convert_reports_type_mismatch() {
        let err = ConvertTo::of::<Post>()
            .apply(json!({"id": "one", "title": "hello"}), false)
            .expect_err("should fail");
        assert!(err.to_string().contains("id"), "unexpected error: {err}");
    }

    #[test]
    fn validation_turns_type_mismatch_into_violation() {
        let value = json!({"id": "one", "title": "hello"});
        let converted = ConvertTo::of::<Post>().apply(value.clone(), true).expect("convert");

        assert_eq!(converted.value, value);
        assert_eq!(converted.violations.len(), 1);
        assert_eq!(converted.violations[0].path, "id");
    }

    #[test]
    fn validation_reports_missing_field_at_root() {
        let converted = ConvertTo::of::<Post>().apply(json!({"id": 1}), true).expect("convert");

        assert_eq!(converted.violations.len(), 1);
        assert_eq!(converted.violations[0].path, "");
        assert!(converted.violations[0].message.contains("title"));
    }

    #[test]
    fn violation_nesting() {
        assert_eq!(Violation::new("title", "m").nested_in("[2]").path, "[2].title");
        assert_eq!(Violation::new("", "m").nested_in("[0]").path, "[0]");
        assert_eq!(Violation::new("[1]", "m").nested_in("tags").path, "tags[1]");
        assert_eq!(Violation::new("title", "m").to_string(), "title: m");
    }

    #[test]
    fn convert_to_debug_names_type() {
        let debug = format!("{:?}", ConvertTo::of::<Post>());
        assert!(debug.contains("Post"), "unexpected debug: {debug}");
    }
}
