//! Positional argument lists.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CodecError;
use crate::value::Value;

/// A positional argument is missing or has the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("missing argument {index} (got {len} arguments)")]
    Missing { index: usize, len: usize },

    #[error("argument {index}: expected {expected}, found {found}")]
    WrongType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// An ordered list of dynamically-typed arguments.
///
/// Guest exports receive it by value; host functions receive it as a single
/// record and pull positional fields out with the typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Args(Vec<Value>);

impl Args {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    /// The argument at `index`, or [`ArgError::Missing`].
    pub fn require(&self, index: usize) -> Result<&Value, ArgError> {
        self.0.get(index).ok_or(ArgError::Missing {
            index,
            len: self.0.len(),
        })
    }

    pub fn str_at(&self, index: usize) -> Result<&str, ArgError> {
        let value = self.require(index)?;
        value.as_str().ok_or(ArgError::WrongType {
            index,
            expected: "string",
            found: value.type_name(),
        })
    }

    pub fn int_at(&self, index: usize) -> Result<i64, ArgError> {
        let value = self.require(index)?;
        value.as_int().ok_or(ArgError::WrongType {
            index,
            expected: "int",
            found: value.type_name(),
        })
    }

    pub fn float_at(&self, index: usize) -> Result<f64, ArgError> {
        let value = self.require(index)?;
        value.as_float().ok_or(ArgError::WrongType {
            index,
            expected: "float",
            found: value.type_name(),
        })
    }

    pub fn bool_at(&self, index: usize) -> Result<bool, ArgError> {
        let value = self.require(index)?;
        value.as_bool().ok_or(ArgError::WrongType {
            index,
            expected: "bool",
            found: value.type_name(),
        })
    }

    /// Build an argument list from a JSON array.
    pub fn from_json(json: serde_json::Value) -> Result<Args, CodecError> {
        match json {
            serde_json::Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Value::from_json(item, &format!("args[{i}]")))
                .collect(),
            other => Err(CodecError::Unsupported {
                position: "args".to_string(),
                reason: format!("expected a JSON array, found {other}"),
            }),
        }
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl FromIterator<Value> for Args {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Args {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn typed_accessors() {
        let a = args!["martin", 7, 1.5, false];
        assert_eq!(a.str_at(0), Ok("martin"));
        assert_eq!(a.int_at(1), Ok(7));
        assert_eq!(a.float_at(2), Ok(1.5));
        assert_eq!(a.bool_at(3), Ok(false));
    }

    #[test]
    fn accessor_errors_name_position() {
        let a = args!["martin"];
        assert_eq!(a.int_at(0), Err(ArgError::WrongType { index: 0, expected: "int", found: "string" }));
        assert_eq!(a.str_at(3), Err(ArgError::Missing { index: 3, len: 1 }));
    }

    #[test]
    fn from_json_requires_array() {
        let ok = Args::from_json(serde_json::json!(["a", 1])).unwrap();
        assert_eq!(ok, args!["a", 1]);
        assert!(matches!(
            Args::from_json(serde_json::json!({"a": 1})),
            Err(CodecError::Unsupported { .. })
        ));
    }
}
