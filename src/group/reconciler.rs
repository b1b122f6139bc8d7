//! Update reconciliation.
//!
//! Deltas are split three ways:
//!
//! - **replace-only**: multi-valued attributes the API only accepts as whole
//!   arrays. Their current values are read once, merged with the requested
//!   add/remove sets, and written back in full.
//! - **relationships**: forwarded to [`apply_membership`].
//! - **direct**: written as-is in the patch body.
//!
//! The patch and each relationship collection are separate remote effects. A
//! failed projection read aborts the update before anything is written;
//! otherwise all three are attempted and the first failure is reported.

use super::mapper::insert_at_path;
use super::relationships::{Relationship, apply_membership};
use crate::attribute::{AttributeDelta, Uid};
use crate::endpoint::{DirectoryEndpoint, EndpointContext, ODataQuery};
use crate::error::{SyncError, SyncResult};
use crate::schema::{AttributeInfo, ObjectClassInfo, PatchSemantics};
use log::{debug, info, trace, warn};
use serde_json::{Map, Value};

/// Deltas of one update, grouped by how they reach the directory.
#[derive(Debug, Default)]
pub struct PartitionedDeltas<'d> {
    pub replace_only: Vec<&'d AttributeDelta>,
    pub relationships: Vec<&'d AttributeDelta>,
    pub direct: Vec<&'d AttributeDelta>,
}

impl PartitionedDeltas<'_> {
    /// Names of the fields that need a projection read.
    pub fn read_set(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for delta in &self.replace_only {
            if !names.contains(&delta.name.as_str()) {
                names.push(&delta.name);
            }
        }
        names
    }
}

/// Split deltas by the patch semantics of their attribute.
///
/// A full replacement of a replace-only attribute needs no read and is written
/// directly. Deltas naming attributes outside the schema are ignored.
pub fn partition<'d>(
    schema: &ObjectClassInfo,
    deltas: &'d [AttributeDelta],
) -> PartitionedDeltas<'d> {
    let mut parts = PartitionedDeltas::default();
    for delta in deltas {
        let Some(info) = schema.attribute(&delta.name) else {
            continue;
        };
        match info.patch_semantics {
            PatchSemantics::Reference => parts.relationships.push(delta),
            PatchSemantics::ReplaceOnly if !delta.is_replace() => parts.replace_only.push(delta),
            _ if delta.is_replace() => parts.direct.push(delta),
            _ => {}
        }
    }
    parts
}

/// Compute `(current ∪ add) − remove`, keeping first-seen order.
pub fn merge_values(current: &[Value], add: &[Value], remove: &[Value]) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::with_capacity(current.len() + add.len());
    for value in current.iter().chain(add) {
        if !remove.contains(value) && !merged.contains(value) {
            merged.push(value.clone());
        }
    }
    merged
}

/// Patch value of a direct replacement.
///
/// An empty replacement clears a single-valued attribute.
fn direct_value(info: &AttributeInfo, delta: &AttributeDelta) -> Value {
    let values = delta.values_to_replace.clone().unwrap_or_default();
    if info.multi_valued {
        Value::Array(values)
    } else {
        values.into_iter().next().unwrap_or(Value::Null)
    }
}

/// Read the current values of `fields`, dropping anything else in the answer.
async fn read_current<E: DirectoryEndpoint>(
    context: &EndpointContext<E>,
    resource_path: &str,
    fields: &[&str],
) -> SyncResult<Map<String, Value>> {
    let query = ODataQuery::new().with_select(fields.iter().copied());
    debug!("Projection read of {} ({})", resource_path, query);
    let current = context.endpoint().get(resource_path, &query).await?;

    let Value::Object(current) = current else {
        return Err(SyncError::invalid_response(format!(
            "Projection read of {} did not return an object",
            resource_path
        )));
    };
    Ok(current
        .into_iter()
        .filter(|(key, _)| fields.contains(&key.as_str()))
        .collect())
}

/// Build the patch body from merged replace-only fields and direct deltas.
fn build_patch_body(
    schema: &ObjectClassInfo,
    parts: &PartitionedDeltas<'_>,
    current: &Map<String, Value>,
) -> Map<String, Value> {
    let mut body = Map::new();

    for delta in &parts.replace_only {
        let existing = current
            .get(&delta.name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let base = match body.get(&delta.name).and_then(Value::as_array) {
            Some(already_merged) => already_merged.clone(),
            None => existing.to_vec(),
        };
        let merged = merge_values(&base, &delta.values_to_add, &delta.values_to_remove);
        body.insert(delta.name.clone(), Value::Array(merged));
    }

    for delta in &parts.direct {
        if let Some(info) = schema.attribute(&delta.name) {
            insert_at_path(&mut body, &delta.name, direct_value(info, delta));
        }
    }

    body
}

/// Apply an update: projection read, merged patch, then relationship sync.
pub async fn reconcile<E: DirectoryEndpoint>(
    context: &EndpointContext<E>,
    schema: &ObjectClassInfo,
    collection_path: &str,
    uid: &Uid,
    deltas: &[AttributeDelta],
) -> SyncResult<()> {
    let parts = partition(schema, deltas);
    let resource_path = format!("{}/{}", collection_path, uid);
    info!(
        "Reconciling {}: {} replace-only, {} direct, {} relationship deltas",
        uid,
        parts.replace_only.len(),
        parts.direct.len(),
        parts.relationships.len()
    );

    let read_set = parts.read_set();
    let current = if read_set.is_empty() {
        Map::new()
    } else {
        read_current(context, &resource_path, &read_set).await?
    };

    let body = build_patch_body(schema, &parts, &current);
    let mut first_error: Option<SyncError> = None;

    if body.is_empty() {
        debug!("Nothing to patch on {}", resource_path);
    } else {
        let body = Value::Object(body);
        trace!("Patch body for {}: {}", resource_path, body);
        if let Err(e) = context.endpoint().update_no_content(&resource_path, body).await {
            first_error = Some(e.into());
        }
    }

    for delta in &parts.relationships {
        let Some(relationship) = Relationship::for_attribute(&delta.name, context.config()) else {
            continue;
        };
        if let Err(e) =
            apply_membership(context, collection_path, uid, Some(*delta), relationship).await
        {
            if let Some(reported) = &first_error {
                warn!(
                    "Relationship sync of {} on {} failed after earlier error ({}): {}",
                    delta.name, uid, reported, e
                );
            } else {
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
