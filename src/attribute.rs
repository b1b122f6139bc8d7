//! Generic attribute model shared by every resource kind.
//!
//! Attribute values are carried as [`serde_json::Value`]: scalars for
//! single-valued attributes and arrays for multi-valued ones. Callers describe
//! writes with an [`AttributeSet`] (create) or a list of [`AttributeDelta`]
//! (update), and receive [`DirectoryObject`]s from queries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Server-assigned identifier of a directory object.
///
/// For groups the identifier doubles as the object's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(String);

impl Uid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Uid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A named set of attribute values.
///
/// Ordered by attribute name so payloads built from it are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(flatten)]
    attributes: BTreeMap<String, Value>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute value, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Get a multi-valued attribute as strings, skipping non-string entries.
    pub fn get_strings(&self, name: &str) -> Option<Vec<&str>> {
        self.get(name).map(|value| match value {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            Value::String(s) => vec![s.as_str()],
            _ => Vec::new(),
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<(String, Value)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// A requested change to one attribute.
///
/// Multi-valued attributes use disjoint add and remove sets. Single-valued
/// attributes (and full multi-valued replacements) use `values_to_replace`;
/// an empty replacement clears the attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDelta {
    pub name: String,
    #[serde(default)]
    pub values_to_add: Vec<Value>,
    #[serde(default)]
    pub values_to_remove: Vec<Value>,
    #[serde(default)]
    pub values_to_replace: Option<Vec<Value>>,
}

impl AttributeDelta {
    /// Incremental change to a multi-valued attribute.
    pub fn add_remove(name: impl Into<String>, add: Vec<Value>, remove: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values_to_add: add,
            values_to_remove: remove,
            values_to_replace: None,
        }
    }

    /// Add values to a multi-valued attribute.
    pub fn add(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self::add_remove(name, values, Vec::new())
    }

    /// Remove values from a multi-valued attribute.
    pub fn remove(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self::add_remove(name, Vec::new(), values)
    }

    /// Replace every value of an attribute.
    pub fn replace(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values_to_add: Vec::new(),
            values_to_remove: Vec::new(),
            values_to_replace: Some(values),
        }
    }

    /// Replace a single-valued attribute.
    pub fn replace_single(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::replace(name, vec![value.into()])
    }

    /// Whether this delta carries a full replacement rather than add/remove sets.
    pub fn is_replace(&self) -> bool {
        self.values_to_replace.is_some()
    }

    /// Whether this delta carries add or remove values.
    pub fn is_incremental(&self) -> bool {
        !self.values_to_add.is_empty() || !self.values_to_remove.is_empty()
    }

    /// Added values that are strings, in request order.
    pub fn string_values_to_add(&self) -> impl Iterator<Item = &str> {
        self.values_to_add.iter().filter_map(Value::as_str)
    }

    /// Removed values that are strings, in request order.
    pub fn string_values_to_remove(&self) -> impl Iterator<Item = &str> {
        self.values_to_remove.iter().filter_map(Value::as_str)
    }
}

/// Per-call options for queries and updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationOptions {
    /// Attributes the caller explicitly asked for; `None` means defaults only
    pub attributes_to_get: Option<Vec<String>>,
    /// Page size override for paginated lists
    pub page_size: Option<u32>,
}

impl OperationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request specific attributes.
    pub fn with_attributes_to_get<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes_to_get = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Whether the caller explicitly requested an attribute.
    pub fn requests(&self, name: &str) -> bool {
        self.attributes_to_get
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == name))
    }
}

/// A materialized directory object.
///
/// Attributes that were not fetched are listed in `incomplete` instead of
/// being omitted, so "not fetched" stays distinguishable from "empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryObject {
    pub object_class: String,
    pub uid: Uid,
    pub name: String,
    pub attributes: AttributeSet,
    #[serde(default)]
    pub incomplete: BTreeSet<String>,
}

impl DirectoryObject {
    pub fn new(object_class: impl Into<String>, uid: Uid, name: impl Into<String>) -> Self {
        Self {
            object_class: object_class.into(),
            uid,
            name: name.into(),
            attributes: AttributeSet::new(),
            incomplete: BTreeSet::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Flag an attribute as present but not fetched.
    pub fn mark_incomplete(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.attributes.remove(&name);
        self.incomplete.insert(name);
    }

    pub fn is_incomplete(&self, name: &str) -> bool {
        self.incomplete.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_set_accessors() {
        let attrs = AttributeSet::new()
            .with("displayName", "Sales")
            .with("groupTypes", json!(["Unified", "DynamicMembership"]));

        assert_eq!(attrs.get_string("displayName"), Some("Sales"));
        assert_eq!(
            attrs.get_strings("groupTypes"),
            Some(vec!["Unified", "DynamicMembership"])
        );
        assert!(attrs.has("groupTypes"));
        assert_eq!(attrs.names().collect::<Vec<_>>(), vec!["displayName", "groupTypes"]);
    }

    #[test]
    fn test_delta_shapes() {
        let delta = AttributeDelta::add_remove("members", vec![json!("u1")], vec![json!("u2")]);
        assert!(delta.is_incremental());
        assert!(!delta.is_replace());
        assert_eq!(delta.string_values_to_add().collect::<Vec<_>>(), vec!["u1"]);

        let delta = AttributeDelta::replace_single("description", "Quarterly planning");
        assert!(delta.is_replace());
        assert!(!delta.is_incremental());
    }

    #[test]
    fn test_delta_deserializes_with_defaults() {
        let delta: AttributeDelta = serde_json::from_value(json!({
            "name": "owners",
            "valuesToAdd": ["a"]
        }))
        .unwrap();
        assert_eq!(delta.values_to_add, vec![json!("a")]);
        assert!(delta.values_to_remove.is_empty());
        assert!(delta.values_to_replace.is_none());
    }

    #[test]
    fn test_options_requests() {
        let options = OperationOptions::new().with_attributes_to_get(["members"]);
        assert!(options.requests("members"));
        assert!(!options.requests("owners"));
        assert!(!OperationOptions::new().requests("members"));
    }

    #[test]
    fn test_mark_incomplete_drops_value() {
        let mut object = DirectoryObject::new("Group", Uid::new("g1"), "g1");
        object.attributes.set("members", json!([]));
        object.mark_incomplete("members");
        assert!(object.is_incomplete("members"));
        assert!(object.attribute("members").is_none());
    }
}
