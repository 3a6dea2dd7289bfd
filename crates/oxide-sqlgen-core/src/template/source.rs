//! Parameter bags a template can be executed against.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::TemplateError;
use crate::value::TypedValue;

/// A name-to-value lookup used to bind template placeholders.
pub trait ParameterSource {
    /// Returns the value bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<TypedValue>;

    /// Returns every entry of the source.
    fn entries(&self) -> Vec<(String, TypedValue)>;
}

impl<S: BuildHasher> ParameterSource for HashMap<String, TypedValue, S> {
    fn lookup(&self, name: &str) -> Option<TypedValue> {
        self.get(name).cloned()
    }

    fn entries(&self) -> Vec<(String, TypedValue)> {
        // Sorted so that passthrough order does not depend on hashing.
        let mut entries: Vec<_> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl ParameterSource for BTreeMap<String, TypedValue> {
    fn lookup(&self, name: &str) -> Option<TypedValue> {
        self.get(name).cloned()
    }

    fn entries(&self) -> Vec<(String, TypedValue)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<S: BuildHasher> ParameterSource for IndexMap<String, TypedValue, S> {
    fn lookup(&self, name: &str) -> Option<TypedValue> {
        self.get(name).cloned()
    }

    fn entries(&self) -> Vec<(String, TypedValue)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// A record-like parameter source built from any serializable struct.
///
/// Top-level fields become parameters; nested arrays and objects are
/// bound as their JSON text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: IndexMap<String, TypedValue>,
}

impl Record {
    /// Serializes `value` and collects its fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSource` if `value` fails to serialize or does not
    /// serialize to an object.
    pub fn new<T: Serialize + ?Sized>(value: &T) -> Result<Self, TemplateError> {
        let json = serde_json::to_value(value)
            .map_err(|e| TemplateError::InvalidSource(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Collects the fields of a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSource` if `json` is not an object.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, TemplateError> {
        let object = json.as_object().ok_or_else(|| {
            TemplateError::InvalidSource(format!("expected an object, found {json}"))
        })?;
        Ok(Self {
            fields: object
                .iter()
                .map(|(k, v)| (k.clone(), TypedValue::from_json(v)))
                .collect(),
        })
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl ParameterSource for Record {
    fn lookup(&self, name: &str) -> Option<TypedValue> {
        self.fields.lookup(name)
    }

    fn entries(&self) -> Vec<(String, TypedValue)> {
        self.fields.entries()
    }
}
