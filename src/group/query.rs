//! Query translation and paginated listing.
//!
//! A [`GroupFilter`] is first translated into a [`QueryExpression`], which is
//! then resolved into a [`RetrievalPlan`]: a single read or a paginated list.
//! [`stream`] executes the plan, handing each materialized object to a
//! consumer that can stop the traversal.

use super::kind::ResourceKind;
use super::materializer::materialize;
use crate::attribute::{DirectoryObject, OperationOptions, Uid};
use crate::endpoint::{DirectoryEndpoint, EndpointContext, ODataQuery, escape_literal};
use crate::error::{SyncError, SyncResult};
use crate::schema::ObjectClassInfo;
use crate::schema::group::{ATTR_ID, ATTR_MEMBERS};
use log::{debug, info};
use serde_json::Value;

/// Filter over group attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupFilter {
    Equals { attribute: String, value: Value },
    StartsWith { attribute: String, prefix: String },
    And(Box<GroupFilter>, Box<GroupFilter>),
    Or(Box<GroupFilter>, Box<GroupFilter>),
    Not(Box<GroupFilter>),
}

impl GroupFilter {
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn starts_with(attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::StartsWith {
            attribute: attribute.into(),
            prefix: prefix.into(),
        }
    }

    pub fn and(self, other: GroupFilter) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: GroupFilter) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }
}

/// Result of translating a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpression {
    /// No filter: every object
    FetchAll,
    /// `id eq '<uid>'`
    Identity(Uid),
    /// Groups the given directory object is a member of
    Membership(String),
    /// Remote `$filter` expression
    Filter(String),
}

/// Translate an optional filter.
///
/// Only a top-level `Equals` on `id` or `members` becomes an identity or
/// membership expression. Membership cannot be combined with other
/// conditions, since the directory has no filter for it.
pub fn translate(filter: Option<&GroupFilter>) -> SyncResult<QueryExpression> {
    let Some(filter) = filter else {
        return Ok(QueryExpression::FetchAll);
    };

    match filter {
        GroupFilter::Equals { attribute, value } if attribute == ATTR_ID => {
            let id = value
                .as_str()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| SyncError::invalid_argument("Identifier filter needs a string"))?;
            Ok(QueryExpression::Identity(Uid::new(id)))
        }
        GroupFilter::Equals { attribute, value } if attribute == ATTR_MEMBERS => {
            let member = value
                .as_str()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| SyncError::invalid_argument("Membership filter needs a string"))?;
            Ok(QueryExpression::Membership(member.to_string()))
        }
        other => Ok(QueryExpression::Filter(render(other)?)),
    }
}

fn render(filter: &GroupFilter) -> SyncResult<String> {
    Ok(match filter {
        GroupFilter::Equals { attribute, .. } if attribute == ATTR_MEMBERS => {
            return Err(SyncError::invalid_argument(
                "Membership filters cannot be combined with other conditions",
            ));
        }
        GroupFilter::Equals { attribute, value } => {
            format!("{} eq {}", attribute, render_literal(value)?)
        }
        GroupFilter::StartsWith { attribute, prefix } => {
            format!("startswith({}, '{}')", attribute, escape_literal(prefix))
        }
        GroupFilter::And(left, right) => format!("({}) and ({})", render(left)?, render(right)?),
        GroupFilter::Or(left, right) => format!("({}) or ({})", render(left)?, render(right)?),
        GroupFilter::Not(inner) => format!("not ({})", render(inner)?),
    })
}

fn render_literal(value: &Value) -> SyncResult<String> {
    match value {
        Value::String(s) => Ok(format!("'{}'", escape_literal(s))),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(SyncError::invalid_argument(format!(
            "Unsupported filter value: {}",
            other
        ))),
    }
}

/// How a query expression is retrieved.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalPlan {
    /// Read one object directly
    Get { path: String },
    /// Page through a collection
    List { path: String, query: ODataQuery },
}

/// Resolve an expression into a read or a paginated list.
///
/// `fetch_specific` turns an identity expression into a direct read; in every
/// other case the result is a list of `page_size` items per page.
pub fn plan(
    expression: &QueryExpression,
    fetch_specific: bool,
    collection_path: &str,
    page_size: u32,
) -> RetrievalPlan {
    let paged = ODataQuery::new().with_top(page_size);
    match expression {
        QueryExpression::FetchAll => RetrievalPlan::List {
            path: collection_path.to_string(),
            query: paged,
        },
        QueryExpression::Identity(uid) if fetch_specific => RetrievalPlan::Get {
            path: format!("{}/{}", collection_path, uid),
        },
        QueryExpression::Identity(uid) => RetrievalPlan::List {
            path: collection_path.to_string(),
            query: paged.with_filter(format!(
                "{} eq '{}'",
                ATTR_ID,
                escape_literal(uid.as_str())
            )),
        },
        QueryExpression::Membership(member) => RetrievalPlan::List {
            path: format!(
                "/directoryObjects/{}/memberOf/microsoft.graph.group",
                member
            ),
            query: paged,
        },
        QueryExpression::Filter(filter) => RetrievalPlan::List {
            path: collection_path.to_string(),
            query: paged.with_filter(filter.clone()),
        },
    }
}

/// Execute a plan, passing each materialized object to `handler`.
///
/// Pages are requested one at a time; once `handler` returns `false` no
/// further page is requested. Returns the number of objects handed over.
pub async fn stream<E, K, F>(
    context: &EndpointContext<E>,
    kind: &K,
    schema: &ObjectClassInfo,
    plan: RetrievalPlan,
    options: &OperationOptions,
    mut handler: F,
) -> SyncResult<usize>
where
    E: DirectoryEndpoint,
    K: ResourceKind,
    F: FnMut(DirectoryObject) -> bool + Send,
{
    match plan {
        RetrievalPlan::Get { path } => {
            info!("Fetching {} {}", kind.type_name(), path);
            let raw = context.endpoint().get(&path, &ODataQuery::new()).await?;
            let object = materialize(context, kind, schema, &raw, options).await?;
            handler(object);
            Ok(1)
        }
        RetrievalPlan::List { path, query } => {
            info!("Listing {} from {} ({})", kind.type_name(), path, query);
            let mut pager = context.pager(path, query);
            let mut delivered = 0;

            while let Some(page) = pager.next_page().await? {
                for raw in page {
                    let object = materialize(context, kind, schema, &raw, options).await?;
                    delivered += 1;
                    if !handler(object) {
                        debug!(
                            "Consumer stopped after {} objects ({} pages)",
                            delivered,
                            pager.pages_fetched()
                        );
                        return Ok(delivered);
                    }
                }
            }

            Ok(delivered)
        }
    }
}
