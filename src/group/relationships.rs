//! Relationship synchronization through reference endpoints.
//!
//! The remote API exposes `members` and `owners` only as collections of
//! references: one `DELETE .../{collection}/{id}/$ref` per removal and one
//! `POST .../{collection}/$ref` per addition. A single [`Relationship`]
//! parameterized by collection and reference namespace serves both.

use crate::attribute::{AttributeDelta, Uid};
use crate::config::SyncConfig;
use crate::endpoint::{DirectoryEndpoint, EndpointContext, ODataQuery};
use crate::error::{EndpointError, SyncResult};
use crate::schema::group::{ATTR_ID, ATTR_MEMBERS, ATTR_OWNERS};
use log::{debug, info, warn};
use serde_json::json;

/// A relationship collection and the namespace its references live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship<'a> {
    pub collection: &'a str,
    pub namespace: &'a str,
}

impl<'a> Relationship<'a> {
    /// Group members: any directory object.
    pub fn members(config: &'a SyncConfig) -> Self {
        Self {
            collection: ATTR_MEMBERS,
            namespace: &config.member_namespace,
        }
    }

    /// Group owners: users only.
    pub fn owners(config: &'a SyncConfig) -> Self {
        Self {
            collection: ATTR_OWNERS,
            namespace: &config.owner_namespace,
        }
    }

    /// Relationship backing an attribute name, if any.
    pub fn for_attribute(name: &str, config: &'a SyncConfig) -> Option<Self> {
        match name {
            ATTR_MEMBERS => Some(Self::members(config)),
            ATTR_OWNERS => Some(Self::owners(config)),
            _ => None,
        }
    }

    fn collection_path(&self, resource_path: &str) -> String {
        format!("{}/{}", resource_path, self.collection)
    }
}

/// Apply one delta to a relationship collection of a resource.
///
/// Removals run before additions. Calls are sequential and the first failure
/// aborts the rest; removing an absent reference or adding a present one is
/// treated as already done, so re-running a partially applied delta is safe.
///
/// A removal answered with `NotFound` is only tolerated once the resource
/// itself is confirmed to exist; a missing resource surfaces as `NotFound`.
pub async fn apply_membership<E: DirectoryEndpoint>(
    context: &EndpointContext<E>,
    collection_path: &str,
    uid: &Uid,
    delta: Option<&AttributeDelta>,
    relationship: Relationship<'_>,
) -> SyncResult<()> {
    let Some(delta) = delta else {
        return Ok(());
    };

    let resource_path = format!("{}/{}", collection_path, uid);
    let references_path = relationship.collection_path(&resource_path);
    info!(
        "Synchronizing {} of {} (+{} / -{})",
        relationship.collection,
        uid,
        delta.values_to_add.len(),
        delta.values_to_remove.len()
    );

    let mut resource_confirmed = false;
    for foreign_id in delta.string_values_to_remove() {
        let path = format!("{}/{}/$ref", references_path, foreign_id);
        debug!("Removing reference {}", path);
        match context.endpoint().delete(&path).await {
            Ok(()) => {}
            Err(EndpointError::NotFound { .. }) => {
                if !resource_confirmed {
                    confirm_exists(context, &resource_path).await?;
                    resource_confirmed = true;
                }
                warn!(
                    "Reference {} already absent from {} of {}",
                    foreign_id, relationship.collection, uid
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    let add_path = format!("{}/$ref", references_path);
    for foreign_id in delta.string_values_to_add() {
        let body = json!({
            "@odata.id": context.config().reference_url(relationship.namespace, foreign_id)
        });
        debug!("Adding reference {} to {}", foreign_id, add_path);
        match context.endpoint().create_no_content(&add_path, body).await {
            Ok(()) => {}
            Err(EndpointError::Conflict { .. }) => {
                warn!(
                    "Reference {} already present in {} of {}",
                    foreign_id, relationship.collection, uid
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Fail with the endpoint's error unless `resource_path` can be read.
async fn confirm_exists<E: DirectoryEndpoint>(
    context: &EndpointContext<E>,
    resource_path: &str,
) -> SyncResult<()> {
    debug!("Confirming {} exists", resource_path);
    let query = ODataQuery::new().with_select([ATTR_ID]);
    context.endpoint().get(resource_path, &query).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{InMemoryDirectory, RequestMethod};
    use serde_json::{Map, json};

    async fn group_with_members(members: &[&str]) -> (EndpointContext<InMemoryDirectory>, Uid) {
        let directory = InMemoryDirectory::new();
        let id = directory.insert_group(Map::new()).await;
        let context = EndpointContext::with_defaults(directory);
        let uid = Uid::new(id);
        let delta = AttributeDelta::add(
            "members",
            members.iter().map(|m| json!(m)).collect(),
        );
        apply_membership(
            &context,
            "/groups",
            &uid,
            Some(&delta),
            Relationship::members(context.config()),
        )
        .await
        .unwrap();
        context.endpoint().clear_requests().await;
        (context, uid)
    }

    #[tokio::test]
    async fn test_absent_delta_is_noop() {
        let (context, uid) = group_with_members(&[]).await;
        apply_membership(
            &context,
            "/groups",
            &uid,
            None,
            Relationship::owners(context.config()),
        )
        .await
        .unwrap();
        assert!(context.endpoint().requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_removals_precede_additions() {
        let (context, uid) = group_with_members(&["u1"]).await;
        let delta = AttributeDelta::add_remove("members", vec![json!("u2")], vec![json!("u1")]);

        apply_membership(
            &context,
            "/groups",
            &uid,
            Some(&delta),
            Relationship::members(context.config()),
        )
        .await
        .unwrap();

        let requests = context.endpoint().requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, RequestMethod::Delete);
        assert_eq!(requests[0].path, format!("/groups/{}/members/u1/$ref", uid));
        assert_eq!(requests[1].method, RequestMethod::Post);
        assert_eq!(requests[1].path, format!("/groups/{}/members/$ref", uid));
        assert_eq!(
            requests[1].body,
            Some(json!({"@odata.id": "https://graph.microsoft.com/v1.0/directoryObjects/u2"}))
        );
        assert_eq!(context.endpoint().members(uid.as_str()).await, vec!["u2"]);
    }

    #[tokio::test]
    async fn test_owner_references_use_user_namespace() {
        let (context, uid) = group_with_members(&[]).await;
        let delta = AttributeDelta::add("owners", vec![json!("o1")]);

        apply_membership(
            &context,
            "/groups",
            &uid,
            Some(&delta),
            Relationship::owners(context.config()),
        )
        .await
        .unwrap();

        let requests = context.endpoint().requests().await;
        assert_eq!(
            requests[0].body,
            Some(json!({"@odata.id": "https://graph.microsoft.com/v1.0/users/o1"}))
        );
        assert_eq!(context.endpoint().owners(uid.as_str()).await, vec!["o1"]);
    }

    #[tokio::test]
    async fn test_repeated_operations_are_tolerated() {
        let (context, uid) = group_with_members(&["u1"]).await;
        let relationship = Relationship::members(context.config());

        let remove = AttributeDelta::remove("members", vec![json!("u9")]);
        apply_membership(&context, "/groups", &uid, Some(&remove), relationship)
            .await
            .unwrap();

        let add = AttributeDelta::add("members", vec![json!("u1")]);
        apply_membership(&context, "/groups", &uid, Some(&add), relationship)
            .await
            .unwrap();

        assert_eq!(context.endpoint().members(uid.as_str()).await, vec!["u1"]);
    }

    #[tokio::test]
    async fn test_absent_references_confirm_resource_once() {
        let (context, uid) = group_with_members(&[]).await;
        let remove = AttributeDelta::remove("members", vec![json!("u8"), json!("u9")]);

        apply_membership(
            &context,
            "/groups",
            &uid,
            Some(&remove),
            Relationship::members(context.config()),
        )
        .await
        .unwrap();

        let requests = context.endpoint().requests().await;
        let methods: Vec<_> = requests.iter().map(|r| r.method).collect();
        assert_eq!(
            methods,
            vec![RequestMethod::Delete, RequestMethod::Get, RequestMethod::Delete]
        );
        assert_eq!(requests[1].path, format!("/groups/{}", uid));
        assert_eq!(requests[1].query, "$select=id");
    }

    #[tokio::test]
    async fn test_removal_from_missing_resource_is_not_found() {
        let context = EndpointContext::with_defaults(InMemoryDirectory::new());
        let remove = AttributeDelta::remove("members", vec![json!("u1")]);

        let result = apply_membership(
            &context,
            "/groups",
            &Uid::new("missing"),
            Some(&remove),
            Relationship::members(context.config()),
        )
        .await;

        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_first_failure_aborts_remaining_calls() {
        let (context, uid) = group_with_members(&["u1", "u2"]).await;
        context
            .endpoint()
            .fail_requests(
                RequestMethod::Delete,
                "/members/u1/",
                EndpointError::Remote {
                    status: 500,
                    code: "internalError".to_string(),
                    message: "boom".to_string(),
                },
            )
            .await;

        let delta = AttributeDelta::add_remove(
            "members",
            vec![json!("u3")],
            vec![json!("u1"), json!("u2")],
        );
        let result = apply_membership(
            &context,
            "/groups",
            &uid,
            Some(&delta),
            Relationship::members(context.config()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(context.endpoint().requests().await.len(), 1);
        assert_eq!(context.endpoint().members(uid.as_str()).await, vec!["u1", "u2"]);
    }

    #[test]
    fn test_relationship_lookup() {
        let config = SyncConfig::default();
        assert_eq!(
            Relationship::for_attribute("owners", &config),
            Some(Relationship {
                collection: "owners",
                namespace: "users"
            })
        );
        assert!(Relationship::for_attribute("groupTypes", &config).is_none());
    }
}
