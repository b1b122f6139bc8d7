//! Group reconciliation.
//!
//! [`GroupProcessor`] exposes the four operations (create, update, delete and
//! query) and composes the components in this module:
//!
//! - [`guard`] - best-effort duplicate name check before create
//! - [`mapper`] - create payloads and identifier extraction
//! - [`reconciler`] - delta partitioning and read-merge-write
//! - [`relationships`] - members/owners through reference endpoints
//! - [`query`] - filter translation and paginated listing
//! - [`materializer`] - raw resources to [`DirectoryObject`]s
//!
//! No operation is transactional. A create whose relationship attachment
//! fails leaves the group in place, and an update may apply its patch but not
//! every relationship change. Re-running the relationship part of the
//! operation is safe, since reference operations already in effect are
//! tolerated.
//!
//! # Example Usage
//!
//! ```rust
//! use directory_sync::{AttributeSet, GroupProcessor, OperationOptions};
//! use directory_sync::endpoint::{EndpointContext, InMemoryDirectory};
//! use directory_sync::group::GroupFilter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = EndpointContext::with_defaults(InMemoryDirectory::new());
//! let processor = GroupProcessor::new(context);
//!
//! let uid = processor
//!     .create(
//!         &AttributeSet::new()
//!             .with("displayName", "Sales")
//!             .with("mailEnabled", false)
//!             .with("mailNickname", "sales")
//!             .with("securityEnabled", true),
//!     )
//!     .await?;
//!
//! let mut names = Vec::new();
//! processor
//!     .query(
//!         Some(&GroupFilter::equals("displayName", "Sales")),
//!         false,
//!         &OperationOptions::new(),
//!         |group| {
//!             names.push(group.name);
//!             true
//!         },
//!     )
//!     .await?;
//! assert_eq!(names, vec![uid.to_string()]);
//! # Ok(())
//! # }
//! ```

pub mod guard;
pub mod kind;
pub mod mapper;
pub mod materializer;
pub mod query;
pub mod reconciler;
pub mod relationships;

pub use kind::{GroupKind, ResourceKind};
pub use query::{GroupFilter, QueryExpression, RetrievalPlan};
pub use relationships::Relationship;

use crate::attribute::{AttributeDelta, AttributeSet, DirectoryObject, OperationOptions, Uid};
use crate::endpoint::{DirectoryEndpoint, EndpointContext};
use crate::error::{SyncError, SyncResult};
use crate::schema::ObjectClassInfo;
use crate::validation::AttributesValidator;
use log::{info, trace, warn};

/// Entry point for group operations against one directory endpoint.
#[derive(Debug)]
pub struct GroupProcessor<E, K = GroupKind> {
    context: EndpointContext<E>,
    kind: K,
    schema: ObjectClassInfo,
}

impl<E: DirectoryEndpoint> GroupProcessor<E, GroupKind> {
    /// Processor for the `Group` object class.
    pub fn new(context: EndpointContext<E>) -> Self {
        Self::with_kind(context, GroupKind::new())
    }
}

impl<E: DirectoryEndpoint, K: ResourceKind> GroupProcessor<E, K> {
    /// Processor for an injected resource kind.
    pub fn with_kind(context: EndpointContext<E>, kind: K) -> Self {
        let schema = kind.build_schema();
        Self {
            context,
            kind,
            schema,
        }
    }

    pub fn context(&self) -> &EndpointContext<E> {
        &self.context
    }

    pub fn schema(&self) -> &ObjectClassInfo {
        &self.schema
    }

    /// Create a resource and return its server-assigned identifier.
    ///
    /// Attributes are validated before any remote call. The name is checked
    /// for an existing resource, the resource is posted without its
    /// relationships, and initial members/owners are then attached through
    /// their reference endpoints.
    pub async fn create(&self, attributes: &AttributeSet) -> SyncResult<Uid> {
        info!(
            "Creating {} with attributes {:?}",
            self.kind.type_name(),
            attributes.names().collect::<Vec<_>>()
        );
        AttributesValidator::new(&self.schema).validate_create(attributes)?;

        let payload = mapper::build_create_payload(&self.schema, attributes);
        let name_attribute = self.kind.name_attribute();
        let name = attributes.get_string(name_attribute).unwrap_or_default();

        if guard::exists(&self.context, self.kind.collection_path(), name_attribute, name).await? {
            return Err(SyncError::already_exists(name_attribute, name));
        }

        trace!("Create payload: {}", payload);
        let response = self
            .context
            .endpoint()
            .create(self.kind.collection_path(), payload)
            .await?;
        let uid = mapper::extract_id(&response)?;
        info!("Created {} {}", self.kind.type_name(), uid);

        for (name, values) in mapper::relationship_values(&self.schema, attributes) {
            let Some(relationship) = Relationship::for_attribute(name, self.context.config())
            else {
                continue;
            };
            let delta = AttributeDelta::add(name, values);
            if let Err(e) = relationships::apply_membership(
                &self.context,
                self.kind.collection_path(),
                &uid,
                Some(&delta),
                relationship,
            )
            .await
            {
                warn!(
                    "{} {} created but its {} were not fully attached",
                    self.kind.type_name(),
                    uid,
                    name
                );
                return Err(e);
            }
        }

        Ok(uid)
    }

    /// Apply attribute deltas to an existing resource.
    ///
    /// `options` only carries query settings (requested attributes and page
    /// size). An update issues no paginated request and returns no
    /// attributes, so the requests it makes do not depend on them.
    pub async fn update(
        &self,
        uid: &Uid,
        deltas: &[AttributeDelta],
        _options: &OperationOptions,
    ) -> SyncResult<()> {
        info!("Updating {} {} ({} deltas)", self.kind.type_name(), uid, deltas.len());
        require_uid(uid)?;
        AttributesValidator::new(&self.schema).validate_deltas(deltas)?;

        reconciler::reconcile(
            &self.context,
            &self.schema,
            self.kind.collection_path(),
            uid,
            deltas,
        )
        .await
    }

    /// Delete a resource.
    pub async fn delete(&self, uid: &Uid) -> SyncResult<()> {
        require_uid(uid)?;
        let path = format!("{}/{}", self.kind.collection_path(), uid);
        info!("Deleting {} {}", self.kind.type_name(), uid);
        self.context.endpoint().delete(&path).await?;
        info!("Deleted {} {}", self.kind.type_name(), uid);
        Ok(())
    }

    /// Run a query, streaming each result to `handler`.
    ///
    /// With `fetch_specific`, an identity filter reads the object directly.
    /// Returning `false` from `handler` stops the traversal. Returns the
    /// number of objects delivered.
    pub async fn query<F>(
        &self,
        filter: Option<&GroupFilter>,
        fetch_specific: bool,
        options: &OperationOptions,
        handler: F,
    ) -> SyncResult<usize>
    where
        F: FnMut(DirectoryObject) -> bool + Send,
    {
        let expression = query::translate(filter)?;
        let plan = query::plan(
            &expression,
            fetch_specific,
            self.kind.collection_path(),
            self.context.page_size(options.page_size),
        );
        query::stream(&self.context, &self.kind, &self.schema, plan, options, handler).await
    }

    /// Collect every result of a query.
    pub async fn query_all(
        &self,
        filter: Option<&GroupFilter>,
        options: &OperationOptions,
    ) -> SyncResult<Vec<DirectoryObject>> {
        let mut objects = Vec::new();
        self.query(filter, false, options, |object| {
            objects.push(object);
            true
        })
        .await?;
        Ok(objects)
    }
}

fn require_uid(uid: &Uid) -> SyncResult<()> {
    if uid.is_blank() {
        return Err(SyncError::invalid_argument("Identifier not provided"));
    }
    Ok(())
}
