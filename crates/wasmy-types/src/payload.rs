//! Function results with out-of-band metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// String annotations attached to a payload.
pub type Meta = BTreeMap<String, String>;

/// The result of a managed call: one value plus optional metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub data: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: Meta,
}

impl Payload {
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            meta: Meta::new(),
        }
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}

impl From<Value> for Payload {
    fn from(data: Value) -> Self {
        Self::new(data)
    }
}

impl From<(Value, Meta)> for Payload {
    fn from((data, meta): (Value, Meta)) -> Self {
        Self { data, meta }
    }
}
