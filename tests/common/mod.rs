//! Shared test utilities for group reconciliation tests.
//!
//! Provides processor fixtures over the in-memory directory, attribute
//! builders, and a call-counting endpoint wrapper.

#![allow(dead_code)]

use directory_sync::endpoint::{
    DirectoryEndpoint, EndpointContext, InMemoryDirectory, ODataQuery, Page,
};
use directory_sync::error::EndpointResult;
use directory_sync::{AttributeSet, GroupProcessor, SyncConfig, Uid};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Install a test logger once per test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Processor over a fresh in-memory directory with default configuration.
pub fn processor() -> GroupProcessor<InMemoryDirectory> {
    init_logging();
    GroupProcessor::new(EndpointContext::with_defaults(InMemoryDirectory::new()))
}

/// Processor with a small page size, for pagination tests.
pub fn paged_processor(page_size: u32) -> GroupProcessor<InMemoryDirectory> {
    init_logging();
    let config = SyncConfig::builder()
        .with_page_size(page_size)
        .build()
        .unwrap();
    GroupProcessor::new(EndpointContext::new(InMemoryDirectory::new(), config).unwrap())
}

/// Minimal valid attributes for a group named `name`.
pub fn group_attributes(name: &str) -> AttributeSet {
    AttributeSet::new()
        .with("displayName", name)
        .with("mailEnabled", false)
        .with(
            "mailNickname",
            name.to_lowercase().replace(|c: char| !c.is_alphanumeric(), ""),
        )
        .with("securityEnabled", true)
}

/// Create `count` groups named `Group 00`, `Group 01`, ...
pub async fn seed_groups(processor: &GroupProcessor<InMemoryDirectory>, count: usize) -> Vec<Uid> {
    let mut uids = Vec::with_capacity(count);
    for i in 0..count {
        let uid = processor
            .create(&group_attributes(&format!("Group {:02}", i)))
            .await
            .unwrap();
        uids.push(uid);
    }
    uids
}

/// Register a user that can be referenced as member or owner.
pub async fn seed_user(directory: &InMemoryDirectory, id: &str) {
    directory
        .insert_object(json!({
            "id": id,
            "userPrincipalName": format!("{}@example.com", id),
            "displayName": format!("User {}", id)
        }))
        .await;
}

/// Per-primitive call counts of a [`CountingEndpoint`].
#[derive(Debug, Default)]
pub struct CallCounts {
    pub create: AtomicUsize,
    pub create_no_content: AtomicUsize,
    pub update_no_content: AtomicUsize,
    pub delete: AtomicUsize,
    pub get: AtomicUsize,
    pub list_page: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        [
            &self.create,
            &self.create_no_content,
            &self.update_no_content,
            &self.delete,
            &self.get,
            &self.list_page,
        ]
        .iter()
        .map(|count| count.load(Ordering::SeqCst))
        .sum()
    }
}

/// Endpoint wrapper counting every primitive call before delegating.
#[derive(Debug, Clone)]
pub struct CountingEndpoint<E> {
    inner: E,
    pub counts: Arc<CallCounts>,
}

impl<E> CountingEndpoint<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            counts: Arc::new(CallCounts::default()),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: DirectoryEndpoint> DirectoryEndpoint for CountingEndpoint<E> {
    async fn create(&self, path: &str, body: Value) -> EndpointResult<Value> {
        self.counts.create.fetch_add(1, Ordering::SeqCst);
        self.inner.create(path, body).await
    }

    async fn create_no_content(&self, path: &str, body: Value) -> EndpointResult<()> {
        self.counts.create_no_content.fetch_add(1, Ordering::SeqCst);
        self.inner.create_no_content(path, body).await
    }

    async fn update_no_content(&self, path: &str, body: Value) -> EndpointResult<()> {
        self.counts.update_no_content.fetch_add(1, Ordering::SeqCst);
        self.inner.update_no_content(path, body).await
    }

    async fn delete(&self, path: &str) -> EndpointResult<()> {
        self.counts.delete.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(path).await
    }

    async fn get(&self, path: &str, query: &ODataQuery) -> EndpointResult<Value> {
        self.counts.get.fetch_add(1, Ordering::SeqCst);
        self.inner.get(path, query).await
    }

    async fn list_page(
        &self,
        path: &str,
        query: &ODataQuery,
        next_link: Option<&str>,
    ) -> EndpointResult<Page> {
        self.counts.list_page.fetch_add(1, Ordering::SeqCst);
        self.inner.list_page(path, query, next_link).await
    }
}

/// Processor over a counting wrapper around a fresh in-memory directory.
pub fn counting_processor() -> GroupProcessor<CountingEndpoint<InMemoryDirectory>> {
    init_logging();
    GroupProcessor::new(EndpointContext::with_defaults(CountingEndpoint::new(
        InMemoryDirectory::new(),
    )))
}
