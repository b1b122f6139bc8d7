//! Core schema type definitions for directory object classes.
//!
//! These structures describe which attributes an object class has, their
//! cardinality and mutability, and how the remote API lets them be patched.

use serde::{Deserialize, Serialize};

/// Description of one object class (e.g. `Group`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectClassInfo {
    /// Object class name
    pub type_name: String,
    /// Attribute definitions, in declaration order
    pub attributes: Vec<AttributeInfo>,
}

impl ObjectClassInfo {
    /// Look up an attribute by exact name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Attributes that must be present on create.
    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes.iter().filter(|attr| attr.required)
    }

    /// Multi-valued attributes the remote API only accepts as whole arrays.
    pub fn replace_only_attributes(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes
            .iter()
            .filter(|attr| attr.patch_semantics == PatchSemantics::ReplaceOnly)
    }

    /// Attributes synchronized through reference endpoints.
    pub fn relationship_attributes(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes
            .iter()
            .filter(|attr| attr.patch_semantics == PatchSemantics::Reference)
    }

    /// Attributes the remote API leaves out of a read unless asked for.
    pub fn not_returned_by_default(&self) -> impl Iterator<Item = &AttributeInfo> {
        self.attributes.iter().filter(|attr| !attr.returned_by_default)
    }
}

/// Definition of a single attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: AttributeType,
    pub multi_valued: bool,
    pub required: bool,
    pub creatable: bool,
    pub updatable: bool,
    pub returned_by_default: bool,
    pub patch_semantics: PatchSemantics,
}

impl AttributeInfo {
    /// Start a writable, optional single-valued string attribute.
    pub fn builder(name: impl Into<String>) -> AttributeInfoBuilder {
        AttributeInfoBuilder {
            info: AttributeInfo {
                name: name.into(),
                ..Default::default()
            },
        }
    }

    /// Whether clients may write this attribute at all.
    pub fn is_read_only(&self) -> bool {
        !self.creatable && !self.updatable
    }
}

impl Default for AttributeInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            data_type: AttributeType::String,
            multi_valued: false,
            required: false,
            creatable: true,
            updatable: true,
            returned_by_default: true,
            patch_semantics: PatchSemantics::Direct,
        }
    }
}

/// Fluent builder for [`AttributeInfo`].
#[derive(Debug, Clone)]
pub struct AttributeInfoBuilder {
    info: AttributeInfo,
}

impl AttributeInfoBuilder {
    pub fn data_type(mut self, data_type: AttributeType) -> Self {
        self.info.data_type = data_type;
        self
    }

    pub fn required(mut self) -> Self {
        self.info.required = true;
        self
    }

    pub fn multi_valued(mut self) -> Self {
        self.info.multi_valued = true;
        self
    }

    /// Neither creatable nor updatable.
    pub fn read_only(mut self) -> Self {
        self.info.creatable = false;
        self.info.updatable = false;
        self
    }

    pub fn not_returned_by_default(mut self) -> Self {
        self.info.returned_by_default = false;
        self
    }

    pub fn patch_semantics(mut self, semantics: PatchSemantics) -> Self {
        self.info.patch_semantics = semantics;
        self
    }

    pub fn build(self) -> AttributeInfo {
        self.info
    }
}

/// Attribute value types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    #[default]
    String,
    Boolean,
    Integer,
    /// RFC 3339 timestamp carried as a string
    DateTime,
}

impl AttributeType {
    /// Whether a JSON scalar has this type.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            AttributeType::String | AttributeType::DateTime => value.is_string(),
            AttributeType::Boolean => value.is_boolean(),
            AttributeType::Integer => value.is_i64() || value.is_u64(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Boolean => "boolean",
            AttributeType::Integer => "integer",
            AttributeType::DateTime => "dateTime",
        }
    }
}

/// How the remote API lets an attribute be changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatchSemantics {
    /// Written directly in the patch body
    #[default]
    Direct,
    /// Multi-valued, but the API only accepts the complete array
    ReplaceOnly,
    /// Relationship maintained through add/remove reference endpoints
    Reference,
}
