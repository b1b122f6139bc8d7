//! Attribute validation against an object class.
//!
//! Checks run locally, before any remote call, so a rejected create or update
//! never touches the directory.

use crate::attribute::{AttributeDelta, AttributeSet};
use crate::error::{ValidationError, ValidationResult};
use crate::schema::{AttributeInfo, ObjectClassInfo, PatchSemantics};
use serde_json::Value;

/// Validates attribute sets and deltas for one object class.
#[derive(Debug, Clone)]
pub struct AttributesValidator<'a> {
    schema: &'a ObjectClassInfo,
    non_empty: Vec<String>,
}

impl<'a> AttributesValidator<'a> {
    /// Validator requiring the object class's required attributes.
    pub fn new(schema: &'a ObjectClassInfo) -> Self {
        Self {
            schema,
            non_empty: schema
                .required_attributes()
                .map(|attr| attr.name.clone())
                .collect(),
        }
    }

    /// Additionally require the given attributes to be present and non-empty.
    pub fn with_non_empty<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.non_empty.contains(&name) {
                self.non_empty.push(name);
            }
        }
        self
    }

    /// Validate the attributes of a create request.
    pub fn validate_create(&self, attributes: &AttributeSet) -> ValidationResult<()> {
        for name in &self.non_empty {
            if attributes.get(name).is_none_or(is_empty_value) {
                return Err(ValidationError::missing_required(name));
            }
        }

        for (name, value) in attributes.iter() {
            let info = self.lookup(name)?;
            if !info.creatable {
                return Err(ValidationError::read_only(name));
            }
            if !value.is_null() {
                check_value_shape(info, value)?;
            }
        }

        Ok(())
    }

    /// Validate the deltas of an update request.
    ///
    /// Rejects unknown and non-updatable attributes, add/remove sets on
    /// attributes that are patched directly, replacements of relationships,
    /// and deltas mixing a replacement with add/remove sets.
    pub fn validate_deltas(&self, deltas: &[AttributeDelta]) -> ValidationResult<()> {
        for delta in deltas {
            let info = self.lookup(&delta.name)?;
            if !info.updatable {
                return Err(ValidationError::read_only(&delta.name));
            }
            if delta.is_replace() && delta.is_incremental() {
                return Err(ValidationError::MixedDelta {
                    attribute: delta.name.clone(),
                });
            }
            match info.patch_semantics {
                PatchSemantics::Direct if delta.is_incremental() => {
                    return Err(ValidationError::IncrementalDelta {
                        attribute: delta.name.clone(),
                    });
                }
                PatchSemantics::Reference if delta.is_replace() => {
                    return Err(ValidationError::ReplacementDelta {
                        attribute: delta.name.clone(),
                    });
                }
                _ => {}
            }

            let values = delta
                .values_to_add
                .iter()
                .chain(delta.values_to_remove.iter())
                .chain(delta.values_to_replace.iter().flatten());
            for value in values {
                if !info.data_type.accepts(value) {
                    return Err(ValidationError::invalid_type(
                        &delta.name,
                        info.data_type.as_str(),
                        json_type_name(value),
                    ));
                }
            }

            if !info.multi_valued
                && delta
                    .values_to_replace
                    .as_ref()
                    .is_some_and(|values| values.len() > 1)
            {
                return Err(ValidationError::invalid_type(
                    &delta.name,
                    info.data_type.as_str(),
                    "array",
                ));
            }
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> ValidationResult<&'a AttributeInfo> {
        self.schema
            .attribute(name)
            .ok_or_else(|| ValidationError::unknown_attribute(name, &self.schema.type_name))
    }
}

/// Absent-equivalent values: null, blank strings and empty arrays.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn check_value_shape(info: &AttributeInfo, value: &Value) -> ValidationResult<()> {
    match (info.multi_valued, value) {
        (true, Value::Array(items)) => {
            for item in items {
                if !info.data_type.accepts(item) {
                    return Err(ValidationError::invalid_type(
                        &info.name,
                        info.data_type.as_str(),
                        json_type_name(item),
                    ));
                }
            }
            Ok(())
        }
        (true, other) => Err(ValidationError::invalid_type(
            &info.name,
            "array",
            json_type_name(other),
        )),
        (false, other) if info.data_type.accepts(other) => Ok(()),
        (false, other) => Err(ValidationError::invalid_type(
            &info.name,
            info.data_type.as_str(),
            json_type_name(other),
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
