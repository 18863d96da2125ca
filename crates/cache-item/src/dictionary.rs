//! Dictionary form of cache records
//!
//! A dictionary is a flat, insertion-ordered JSON object. `FieldReader`
//! records which keys a variant consumed; whatever is left when it finishes
//! is the set of keys this version does not model, which becomes the
//! record's additional info and is written back out unchanged.

use serde_json::{Map, Value};

use crate::constants::keys;
use crate::error::{Error, Result};

/// Wire form of a cache record.
pub type Dictionary = Map<String, Value>;

/// Consumes known keys out of a dictionary being parsed.
pub(crate) struct FieldReader {
    fields: Dictionary,
    consumed: Vec<&'static str>,
}

impl FieldReader {
    pub(crate) fn new(fields: Dictionary) -> Self {
        Self {
            fields,
            consumed: Vec::new(),
        }
    }

    fn take(&mut self, key: &'static str) -> Option<&Value> {
        self.consumed.push(key);
        self.fields.get(key)
    }

    /// Reject a dictionary tagged as a different variant. Untagged input is
    /// accepted: the caller already chose the variant.
    pub(crate) fn expect_type_tag(&mut self, expected: &str) -> Result<()> {
        match self.optional_str(keys::CREDENTIAL_TYPE)? {
            Some(tag) if tag != expected => Err(Error::Parse(format!(
                "record is tagged `{tag}`, expected `{expected}`"
            ))),
            _ => Ok(()),
        }
    }

    pub(crate) fn optional_str(&mut self, key: &'static str) -> Result<Option<String>> {
        match self.take(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::Parse(format!(
                "key `{key}` must be a string, got {other}"
            ))),
        }
    }

    /// A string that must be present and non-empty.
    pub(crate) fn required_str(&mut self, key: &'static str) -> Result<String> {
        self.optional_str(key)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Parse(format!("missing required key `{key}`")))
    }

    /// Unix seconds, written as a decimal string but also accepted as a
    /// JSON integer.
    pub(crate) fn optional_seconds(&mut self, key: &'static str) -> Result<Option<u64>> {
        let invalid = |value: &Value| {
            Error::Parse(format!("key `{key}` must be unix seconds, got {value}"))
        };
        match self.take(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => {
                let seconds = match value {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                };
                seconds.map(Some).ok_or_else(|| invalid(value))
            }
        }
    }

    pub(crate) fn required_seconds(&mut self, key: &'static str) -> Result<u64> {
        self.optional_seconds(key)?
            .ok_or_else(|| Error::Parse(format!("missing required key `{key}`")))
    }

    /// Keys nobody consumed, in their original order.
    pub(crate) fn into_remaining(self) -> Option<Dictionary> {
        let Self { fields, consumed } = self;
        let remaining: Dictionary = fields
            .into_iter()
            .filter(|(key, _)| !consumed.contains(&key.as_str()))
            .collect();
        (!remaining.is_empty()).then_some(remaining)
    }
}

pub(crate) fn insert_str(map: &mut Dictionary, key: &str, value: impl Into<String>) {
    map.insert(key.to_owned(), Value::String(value.into()));
}

pub(crate) fn insert_opt_str(map: &mut Dictionary, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        insert_str(map, key, value);
    }
}

pub(crate) fn insert_seconds(map: &mut Dictionary, key: &str, seconds: u64) {
    insert_str(map, key, seconds.to_string());
}
