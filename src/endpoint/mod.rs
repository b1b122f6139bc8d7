//! Directory endpoint abstraction.
//!
//! The [`DirectoryEndpoint`] trait is the seam between reconciliation logic and
//! the remote directory API. Implementations own transport, authentication,
//! retries and timeouts; this crate only issues single logical requests and
//! follows continuation links through [`Pager`].
//!
//! # Design Principles
//!
//! - **Paths, not URLs**: callers address resources by API-relative paths such
//!   as `/groups/{id}/members/$ref`.
//! - **Errors pass through**: every non-success answer becomes an
//!   [`EndpointError`] and is surfaced to callers unchanged.
//! - **One page at a time**: [`DirectoryEndpoint::list_page`] returns a single
//!   page plus an optional continuation link, so consumers decide when to stop.
//!
//! # Example Usage
//!
//! ```rust
//! use directory_sync::endpoint::{DirectoryEndpoint, InMemoryDirectory, ODataQuery, Pager};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = InMemoryDirectory::new();
//! directory
//!     .create("/groups", json!({"displayName": "Sales", "mailNickname": "sales"}))
//!     .await?;
//!
//! let groups = Pager::new(&directory, "/groups", ODataQuery::new().with_top(10))
//!     .collect_all()
//!     .await?;
//! assert_eq!(groups.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod in_memory;
pub mod pagination;
pub mod query;

pub use in_memory::{InMemoryDirectory, RecordedRequest, RequestMethod};
pub use pagination::{Page, Pager, list_bounded};
pub use query::{ODataQuery, eq_filter, escape_literal};

use crate::config::SyncConfig;
use crate::error::{EndpointResult, SyncResult};
use serde_json::Value;
use std::future::Future;

/// Request primitives offered by the remote directory API.
pub trait DirectoryEndpoint: Send + Sync {
    /// POST a body and return the parsed response.
    fn create(&self, path: &str, body: Value) -> impl Future<Output = EndpointResult<Value>> + Send;

    /// POST a body to an endpoint that answers without content.
    fn create_no_content(
        &self,
        path: &str,
        body: Value,
    ) -> impl Future<Output = EndpointResult<()>> + Send;

    /// PATCH a body to an endpoint that answers without content.
    fn update_no_content(
        &self,
        path: &str,
        body: Value,
    ) -> impl Future<Output = EndpointResult<()>> + Send;

    /// DELETE the resource or reference at `path`.
    fn delete(&self, path: &str) -> impl Future<Output = EndpointResult<()>> + Send;

    /// Read a single object, optionally projected through `$select`.
    fn get(
        &self,
        path: &str,
        query: &ODataQuery,
    ) -> impl Future<Output = EndpointResult<Value>> + Send;

    /// Fetch one page of a collection.
    ///
    /// `next_link` is the continuation returned by the previous page; when set,
    /// it takes precedence over `path` and `query`.
    fn list_page(
        &self,
        path: &str,
        query: &ODataQuery,
        next_link: Option<&str>,
    ) -> impl Future<Output = EndpointResult<Page>> + Send;
}

/// Explicitly constructed endpoint plus configuration.
///
/// Every operation receives its context by reference; nothing is global.
#[derive(Debug, Clone)]
pub struct EndpointContext<E> {
    endpoint: E,
    config: SyncConfig,
}

impl<E: DirectoryEndpoint> EndpointContext<E> {
    /// Create a context after validating the configuration.
    pub fn new(endpoint: E, config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self { endpoint, config })
    }

    /// Create a context with the default configuration.
    pub fn with_defaults(endpoint: E) -> Self {
        Self {
            endpoint,
            config: SyncConfig::default(),
        }
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Page size for a list request, honouring a per-call override.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|size| (1..=crate::config::MAX_PAGE_SIZE).contains(size))
            .unwrap_or(self.config.page_size)
    }

    /// Pager over a collection.
    pub fn pager(&self, path: impl Into<String>, query: ODataQuery) -> Pager<'_, E> {
        Pager::new(&self.endpoint, path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_rejects_invalid_config() {
        let config = SyncConfig {
            page_size: 0,
            ..SyncConfig::default()
        };
        assert!(EndpointContext::new(InMemoryDirectory::new(), config).is_err());
    }

    #[test]
    fn test_page_size_override() {
        let context = EndpointContext::with_defaults(InMemoryDirectory::new());
        assert_eq!(context.page_size(None), 100);
        assert_eq!(context.page_size(Some(5)), 5);
        assert_eq!(context.page_size(Some(0)), 100);
        assert_eq!(context.page_size(Some(5000)), 100);
    }
}
