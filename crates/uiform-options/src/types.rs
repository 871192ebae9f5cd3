//! Core value types for the options store
//!
//! Defines the identifiers and records that flow between field drivers,
//! loaders and the store:
//! - Loader identifiers
//! - Option items as returned by loaders
//! - Per-loader load status and cache entries

use crate::error::OptionsError;
use crate::snapshot::DependencySnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of one async options source
///
/// Always non-empty. Stable for the lifetime of a form session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoaderId(String);

impl LoaderId {
    /// Create a loader id
    ///
    /// # Errors
    /// - `OptionsError::EmptyLoaderId` if `id` is empty or whitespace only
    pub fn new(id: impl Into<String>) -> Result<Self, OptionsError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(OptionsError::EmptyLoaderId);
        }
        Ok(Self(id))
    }

    /// Get id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LoaderId {
    type Error = OptionsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LoaderId> for String {
    fn from(id: LoaderId) -> Self {
        id.0
    }
}

impl Borrow<str> for LoaderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selectable option
///
/// Extra fields returned by a loader are preserved in `extra` and
/// serialized flat next to `value` and `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionItem {
    /// Option value written into the form
    pub value: Value,
    /// Human-readable label
    pub label: String,
    /// Whether the option can be selected
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Any other loader-supplied fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OptionItem {
    /// Create option from value and label
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
            extra: Map::new(),
        }
    }

    /// Mark option as disabled
    #[inline]
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Attach an extra field
    #[inline]
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Normalize a loosely shaped JSON option
    ///
    /// Objects take their label from `label`, then `title`, then the
    /// stringified `value`. Primitives become `{ value, label: String(value) }`.
    #[must_use]
    pub fn from_json(raw: Value) -> Self {
        match raw {
            Value::Object(mut fields) => {
                let value = fields.remove("value").unwrap_or(Value::Null);
                let label = match fields.remove("label") {
                    Some(Value::String(label)) if !label.is_empty() => label,
                    _ => match fields.get("title") {
                        Some(Value::String(title)) if !title.is_empty() => title.clone(),
                        _ => value_to_string(&value),
                    },
                };
                let disabled = matches!(fields.remove("disabled"), Some(Value::Bool(true)));
                Self {
                    value,
                    label,
                    disabled,
                    extra: fields,
                }
            }
            other => Self {
                label: value_to_string(&other),
                value: other,
                disabled: false,
                extra: Map::new(),
            },
        }
    }
}

/// Stringify a JSON value the way option labels and lookup keys expect
///
/// Strings are returned without quotes; everything else uses compact JSON.
#[must_use]
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Value → label lookup over a set of options
///
/// Used to show the label of an already selected value.
#[derive(Debug, Clone, Default)]
pub struct OptionLabels {
    labels: HashMap<String, String>,
}

impl OptionLabels {
    /// Build lookup from options (later duplicates win)
    #[must_use]
    pub fn from_options(options: &[OptionItem]) -> Self {
        let labels = options
            .iter()
            .map(|option| (value_to_string(&option.value), option.label.clone()))
            .collect();
        Self { labels }
    }

    /// Label for `value`, if present
    #[inline]
    #[must_use]
    pub fn label_for(&self, value: &Value) -> Option<&str> {
        self.labels.get(&value_to_string(value)).map(String::as_str)
    }

    /// Label for `value`, or the stringified value when unknown
    #[must_use]
    pub fn display(&self, value: &Value) -> String {
        self.label_for(value)
            .map_or_else(|| value_to_string(value), str::to_string)
    }

    /// Number of known values
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether lookup is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Load status of one loader id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Never requested, or reset
    #[default]
    NotLoaded,
    /// Request dispatched, no response applied yet
    Loading,
    /// Last applied response succeeded
    Loaded,
    /// Last applied response failed
    Error,
}

impl LoadStatus {
    /// Whether a response has been applied
    #[inline]
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotLoaded => "not-loaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// What kind of request produced (or is producing) an entry's options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Dependency-driven load (`ensure_loaded`)
    Dependency,
    /// User-driven search (`search`)
    Search,
}

/// Point-in-time copy of one loader's cache state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    /// Options from the last applied response; `None` before any response
    pub options: Option<Arc<[OptionItem]>>,
    /// Current status
    pub status: LoadStatus,
    /// Failure message, only while `status == Error`
    pub error: Option<String>,
    /// Dependency values behind the last successful dependency-driven load
    pub last_dependency_snapshot: Option<DependencySnapshot>,
    /// Search term behind the current options, when they came from a search
    pub search_term: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loader_id_rejects_blank() {
        assert_eq!(LoaderId::new(""), Err(OptionsError::EmptyLoaderId));
        assert_eq!(LoaderId::new("   "), Err(OptionsError::EmptyLoaderId));
        assert_eq!(LoaderId::new("countries").unwrap().as_str(), "countries");
    }

    #[test]
    fn loader_id_deserialize_validates() {
        let ok: LoaderId = serde_json::from_value(json!("cities")).unwrap();
        assert_eq!(ok.to_string(), "cities");
        assert!(serde_json::from_value::<LoaderId>(json!("")).is_err());
    }

    #[test]
    fn option_from_object_prefers_label_then_title() {
        let labelled = OptionItem::from_json(json!({"value": "US", "label": "United States"}));
        assert_eq!(labelled.label, "United States");

        let titled = OptionItem::from_json(json!({"value": 7, "title": "Seven"}));
        assert_eq!(titled.label, "Seven");
        assert_eq!(titled.extra.get("title"), Some(&json!("Seven")));

        let bare = OptionItem::from_json(json!({"value": 42}));
        assert_eq!(bare.label, "42");
    }

    #[test]
    fn option_from_primitive() {
        let option = OptionItem::from_json(json!("red"));
        assert_eq!(option.value, json!("red"));
        assert_eq!(option.label, "red");

        let number = OptionItem::from_json(json!(3.5));
        assert_eq!(number.label, "3.5");
    }

    #[test]
    fn option_keeps_extra_fields_and_disabled() {
        let option = OptionItem::from_json(json!({
            "value": "MX",
            "label": "Mexico",
            "disabled": true,
            "region": "NA"
        }));
        assert!(option.disabled);
        assert_eq!(option.extra.get("region"), Some(&json!("NA")));
        assert!(!option.extra.contains_key("disabled"));

        let encoded = serde_json::to_value(&option).unwrap();
        assert_eq!(encoded["region"], json!("NA"));
        assert_eq!(encoded["disabled"], json!(true));
    }

    #[test]
    fn labels_lookup_by_stringified_value() {
        let options = vec![OptionItem::new(1, "One"), OptionItem::new("two", "Two")];
        let labels = OptionLabels::from_options(&options);

        assert_eq!(labels.len(), 2);
        assert_eq!(labels.label_for(&json!(1)), Some("One"));
        assert_eq!(labels.label_for(&json!("two")), Some("Two"));
        assert_eq!(labels.display(&json!("three")), "three");
    }

    #[test]
    fn status_settled() {
        assert!(!LoadStatus::NotLoaded.is_settled());
        assert!(!LoadStatus::Loading.is_settled());
        assert!(LoadStatus::Loaded.is_settled());
        assert!(LoadStatus::Error.is_settled());
    }
}
