//! Conversion of raw resources into [`DirectoryObject`]s.

use super::kind::ResourceKind;
use crate::attribute::{DirectoryObject, OperationOptions, Uid};
use crate::endpoint::{DirectoryEndpoint, EndpointContext, ODataQuery};
use crate::error::{SyncError, SyncResult};
use crate::schema::ObjectClassInfo;
use log::debug;
use serde_json::Value;

/// Map a raw resource onto the attributes of `schema`.
///
/// `id` becomes both uid and name. Attributes the API does not return by
/// default are marked incomplete unless the caller requested them; requested
/// relationships are left for [`materialize`] to saturate.
pub fn convert_raw(
    schema: &ObjectClassInfo,
    raw: &Value,
    options: &OperationOptions,
) -> SyncResult<DirectoryObject> {
    let id = raw
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| SyncError::invalid_response("Resource carries no 'id'"))?;
    let mut object = DirectoryObject::new(&schema.type_name, Uid::new(id), id);

    for hidden in schema.not_returned_by_default() {
        if !options.requests(&hidden.name) {
            object.mark_incomplete(&hidden.name);
        }
    }

    for info in &schema.attributes {
        if object.is_incomplete(&info.name) {
            continue;
        }
        if let Some(value) = lookup_path(raw, &info.name).filter(|value| !value.is_null()) {
            object.attributes.set(&info.name, value.clone());
        }
    }

    Ok(object)
}

/// Follow a dotted attribute name into nested objects.
fn lookup_path<'v>(raw: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(raw, |value, segment| value.get(segment))
}

/// Ids of every object in a relationship collection.
pub async fn saturate<E: DirectoryEndpoint>(
    context: &EndpointContext<E>,
    resource_path: &str,
    relationship: &str,
) -> SyncResult<Vec<Value>> {
    let config = context.config();
    let query = ODataQuery::new()
        .with_select(config.saturation_select.iter().cloned())
        .with_top(config.page_size);
    let path = format!("{}/{}", resource_path, relationship);
    debug!("Saturating {}", path);

    let items = context.pager(path, query).collect_all().await?;
    Ok(items
        .into_iter()
        .filter_map(|item| item.get("id").cloned())
        .collect())
}

/// Convert one raw resource and saturate the relationships the caller asked for.
pub async fn materialize<E: DirectoryEndpoint, K: ResourceKind>(
    context: &EndpointContext<E>,
    kind: &K,
    schema: &ObjectClassInfo,
    raw: &Value,
    options: &OperationOptions,
) -> SyncResult<DirectoryObject> {
    let mut object = kind.convert_to_result(raw, options)?;
    let resource_path = format!("{}/{}", kind.collection_path(), object.uid);

    for relationship in schema.relationship_attributes() {
        if options.requests(&relationship.name) {
            let ids = saturate(context, &resource_path, &relationship.name).await?;
            object.attributes.set(&relationship.name, Value::Array(ids));
        }
    }

    Ok(object)
}
