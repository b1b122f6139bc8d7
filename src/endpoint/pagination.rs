//! Continuation-link pagination over a [`DirectoryEndpoint`].

use super::{DirectoryEndpoint, ODataQuery};
use crate::error::EndpointResult;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of a collection response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "value", default)]
    pub items: Vec<Value>,
    #[serde(rename = "@odata.nextLink", default, skip_serializing_if = "Option::is_none")]
    pub next_link: Option<String>,
}

impl Page {
    pub fn new(items: Vec<Value>, next_link: Option<String>) -> Self {
        Self { items, next_link }
    }
}

/// Walks a collection page by page, following continuation links.
///
/// A page is only requested when [`Pager::next_page`] is called, so a consumer
/// that stops calling it stops all further requests.
pub struct Pager<'a, E: ?Sized> {
    endpoint: &'a E,
    path: String,
    query: ODataQuery,
    next_link: Option<String>,
    pages_fetched: usize,
    exhausted: bool,
}

impl<'a, E: DirectoryEndpoint + ?Sized> Pager<'a, E> {
    pub fn new(endpoint: &'a E, path: impl Into<String>, query: ODataQuery) -> Self {
        Self {
            endpoint,
            path: path.into(),
            query,
            next_link: None,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Fetch the next page, or `None` once the collection is exhausted.
    pub async fn next_page(&mut self) -> EndpointResult<Option<Vec<Value>>> {
        if self.exhausted {
            return Ok(None);
        }

        debug!(
            "Listing {} page {} (query: '{}')",
            self.path,
            self.pages_fetched + 1,
            self.query
        );
        let page = self
            .endpoint
            .list_page(&self.path, &self.query, self.next_link.as_deref())
            .await?;
        self.pages_fetched += 1;
        trace!("Received {} items from {}", page.items.len(), self.path);

        match page.next_link {
            Some(link) => self.next_link = Some(link),
            None => self.exhausted = true,
        }

        Ok(Some(page.items))
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Follow every continuation link and return all items.
    pub async fn collect_all(mut self) -> EndpointResult<Vec<Value>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}

/// Fetch only the first page of a collection, ignoring continuation links.
///
/// Used for bounded lookups such as `$top=1` existence checks.
pub async fn list_bounded<E: DirectoryEndpoint + ?Sized>(
    endpoint: &E,
    path: &str,
    query: &ODataQuery,
) -> EndpointResult<Vec<Value>> {
    debug!("Bounded list of {} (query: '{}')", path, query);
    let page = endpoint.list_page(path, query, None).await?;
    Ok(page.items)
}
