//! Attribute mapping between the generic model and remote payloads.
//!
//! Relationship attributes are never written into a resource body; they are
//! synchronized through reference endpoints instead.

use crate::attribute::{AttributeSet, Uid};
use crate::error::{SyncError, SyncResult};
use crate::schema::{ObjectClassInfo, PatchSemantics};
use serde_json::{Map, Value};

/// Build the body of a create request.
///
/// Every attribute except relationships is copied; `null` values are dropped
/// and dotted names become nested objects.
pub fn build_create_payload(schema: &ObjectClassInfo, attributes: &AttributeSet) -> Value {
    let mut payload = Map::new();
    for (name, value) in attributes.iter() {
        if value.is_null() || is_relationship(schema, name) {
            continue;
        }
        insert_at_path(&mut payload, name, value.clone());
    }
    Value::Object(payload)
}

/// Relationship attributes of a create request that carry values, in schema order.
pub fn relationship_values<'a>(
    schema: &'a ObjectClassInfo,
    attributes: &'a AttributeSet,
) -> impl Iterator<Item = (&'a str, Vec<Value>)> + 'a {
    schema.relationship_attributes().filter_map(move |info| {
        let values = match attributes.get(&info.name)? {
            Value::Array(items) => items.clone(),
            Value::Null => return None,
            single => vec![single.clone()],
        };
        (!values.is_empty()).then_some((info.name.as_str(), values))
    })
}

/// Extract the server-assigned identifier from a create answer.
pub fn extract_id(response: &Value) -> SyncResult<Uid> {
    response
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(Uid::from)
        .ok_or_else(|| SyncError::invalid_response("Create response carries no 'id'"))
}

/// Set a value at a dotted path, creating intermediate objects.
pub(crate) fn insert_at_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert_at_path(child, rest, value);
            }
        }
    }
}

fn is_relationship(schema: &ObjectClassInfo, name: &str) -> bool {
    schema
        .attribute(name)
        .is_some_and(|info| info.patch_semantics == PatchSemantics::Reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeInfo, group_object_class};
    use serde_json::json;

    #[test]
    fn test_payload_excludes_relationships() {
        let schema = group_object_class();
        let attrs = AttributeSet::new()
            .with("displayName", "Sales")
            .with("mailEnabled", false)
            .with("description", Value::Null)
            .with("members", json!(["u1", "u2"]))
            .with("owners", json!(["o1"]));

        let payload = build_create_payload(&schema, &attrs);
        assert_eq!(payload, json!({"displayName": "Sales", "mailEnabled": false}));

        let relationships: Vec<_> = relationship_values(&schema, &attrs).collect();
        assert_eq!(
            relationships,
            vec![
                ("members", vec![json!("u1"), json!("u2")]),
                ("owners", vec![json!("o1")]),
            ]
        );
    }

    #[test]
    fn test_dotted_names_are_nested() {
        let schema = ObjectClassInfo {
            type_name: "Device".to_string(),
            attributes: vec![
                AttributeInfo::builder("extensionAttributes.extensionAttribute1").build(),
                AttributeInfo::builder("extensionAttributes.extensionAttribute2").build(),
            ],
        };
        let attrs = AttributeSet::new()
            .with("extensionAttributes.extensionAttribute1", "a")
            .with("extensionAttributes.extensionAttribute2", "b");

        assert_eq!(
            build_create_payload(&schema, &attrs),
            json!({"extensionAttributes": {"extensionAttribute1": "a", "extensionAttribute2": "b"}})
        );
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id(&json!({"id": "g-1"})).unwrap(), Uid::new("g-1"));
        assert!(matches!(
            extract_id(&json!({"displayName": "x"})),
            Err(SyncError::InvalidResponse { .. })
        ));
        assert!(extract_id(&json!({"id": ""})).is_err());
    }
}
