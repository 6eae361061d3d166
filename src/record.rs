//! Record adapter over heterogeneous catalog items.
//!
//! Records arrive as JSON objects from the store or from imported row
//! files; this module normalizes them behind a single `get`-by-field
//! capability so the pipeline never cares which shape they came from.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field keys accepted as the stable record identifier, in lookup order.
pub const ID_KEY_ALIASES: [&str; 3] = ["objectID", "object_id", "id"];

/// A single catalog item: field name to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Record { fields }
    }

    /// Look up a field value by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Assign a field value, replacing any previous value.
    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_string(), value);
    }

    /// Resolve the record identifier via the first matching alias key.
    ///
    /// Returns an empty string when no alias is present; callers decide
    /// how to treat the degraded write target.
    pub fn id(&self) -> String {
        for key in ID_KEY_ALIASES {
            if let Some(value) = self.fields.get(key) {
                let text = display_value(value);
                if !text.is_empty() {
                    return text;
                }
            }
        }
        String::new()
    }

    /// Display form of a field for template substitution; missing fields
    /// substitute as the empty string.
    pub fn display_field(&self, field: &str) -> String {
        self.get(field).map(display_value).unwrap_or_default()
    }

    /// Compact JSON form of the whole record, used in judgment prompts.
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Convert a JSON value to its display string for prompt substitution.
///
/// Strings are used verbatim (no quotes); arrays join their elements'
/// display forms with ", "; objects fall back to compact JSON; null is
/// the empty string.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
