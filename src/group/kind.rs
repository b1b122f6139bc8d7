//! Resource kind capability.
//!
//! A [`ResourceKind`] supplies what differs between object classes: the
//! collection it lives in, its schema, and how a raw resource becomes a
//! [`DirectoryObject`]. The processor receives its kind by injection.

use super::materializer::convert_raw;
use crate::attribute::{DirectoryObject, OperationOptions};
use crate::error::SyncResult;
use crate::schema::group::GROUPS_PATH;
use crate::schema::{GROUP_OBJECT_CLASS, ObjectClassInfo, group_object_class};
use serde_json::Value;

/// Per-object-class behavior used by the processor.
pub trait ResourceKind: Send + Sync {
    /// Object class name, e.g. `Group`.
    fn type_name(&self) -> &str;

    /// API-relative collection path, e.g. `/groups`.
    fn collection_path(&self) -> &str;

    /// Attribute the existence guard matches on.
    fn name_attribute(&self) -> &str;

    fn build_schema(&self) -> ObjectClassInfo;

    /// Convert a raw resource, marking unrequested relationships incomplete.
    fn convert_to_result(
        &self,
        raw: &Value,
        options: &OperationOptions,
    ) -> SyncResult<DirectoryObject>;
}

/// The `Group` object class.
#[derive(Debug, Clone)]
pub struct GroupKind {
    schema: ObjectClassInfo,
}

impl GroupKind {
    pub fn new() -> Self {
        Self {
            schema: group_object_class(),
        }
    }
}

impl Default for GroupKind {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceKind for GroupKind {
    fn type_name(&self) -> &str {
        GROUP_OBJECT_CLASS
    }

    fn collection_path(&self) -> &str {
        GROUPS_PATH
    }

    fn name_attribute(&self) -> &str {
        crate::schema::group::ATTR_DISPLAY_NAME
    }

    fn build_schema(&self) -> ObjectClassInfo {
        self.schema.clone()
    }

    fn convert_to_result(
        &self,
        raw: &Value,
        options: &OperationOptions,
    ) -> SyncResult<DirectoryObject> {
        convert_raw(&self.schema, raw, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_kind() {
        let kind = GroupKind::new();
        assert_eq!(kind.type_name(), "Group");
        assert_eq!(kind.collection_path(), "/groups");
        assert_eq!(kind.build_schema().type_name, kind.type_name());

        let object = kind
            .convert_to_result(&json!({"id": "g1"}), &OperationOptions::new())
            .unwrap();
        assert_eq!(object.object_class, "Group");
    }
}
