//! Best-effort duplicate check before create.
//!
//! The directory allows duplicate display names and only exposes new objects
//! to filters after a replication delay, so two concurrent creates can both
//! pass this check. The guard narrows the window; it cannot close it.

use crate::endpoint::{DirectoryEndpoint, EndpointContext, ODataQuery, eq_filter, list_bounded};
use crate::error::SyncResult;
use log::debug;
use serde_json::Value;

/// Single-result lookup of `name_attribute eq '<name>'`.
pub fn existence_query(name_attribute: &str, name: &str) -> ODataQuery {
    ODataQuery::new()
        .with_filter(eq_filter(name_attribute, name))
        .with_select([name_attribute])
        .with_top(1)
}

/// Whether an object named `name` is already visible in `collection_path`.
///
/// The first result is compared case-insensitively, matching how the
/// directory itself treats names.
pub async fn exists<E: DirectoryEndpoint>(
    context: &EndpointContext<E>,
    collection_path: &str,
    name_attribute: &str,
    name: &str,
) -> SyncResult<bool> {
    let query = existence_query(name_attribute, name);
    let items = list_bounded(context.endpoint(), collection_path, &query).await?;

    let found = items
        .first()
        .and_then(|item| item.get(name_attribute))
        .and_then(Value::as_str)
        .is_some_and(|existing| existing.to_lowercase() == name.to_lowercase());

    debug!(
        "Existence check for {} '{}' in {}: {}",
        name_attribute, name, collection_path, found
    );
    Ok(found)
}
