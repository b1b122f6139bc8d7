//! Group reconciliation against an eventually-consistent directory REST API.
//!
//! Bridges a generic attribute/delta model onto a directory API with limited
//! patch semantics: multi-valued fields that can only be replaced whole,
//! relationships exposed as reference endpoints, names that are only unique by
//! convention, and paginated listing.
//!
//! # Core Components
//!
//! - [`GroupProcessor`] - create, update, delete and query operations
//! - [`DirectoryEndpoint`](endpoint::DirectoryEndpoint) - the remote API seam
//! - [`EndpointContext`](endpoint::EndpointContext) - endpoint plus [`SyncConfig`]
//! - [`schema`] - object class descriptors
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use directory_sync::{AttributeDelta, AttributeSet, GroupProcessor, OperationOptions};
//! use directory_sync::endpoint::{EndpointContext, InMemoryDirectory};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let processor = GroupProcessor::new(EndpointContext::with_defaults(InMemoryDirectory::new()));
//!
//! let uid = processor
//!     .create(
//!         &AttributeSet::new()
//!             .with("displayName", "Engineering")
//!             .with("mailEnabled", false)
//!             .with("mailNickname", "engineering")
//!             .with("securityEnabled", true),
//!     )
//!     .await?;
//!
//! processor
//!     .update(
//!         &uid,
//!         &[
//!             AttributeDelta::add("groupTypes", vec![json!("Unified")]),
//!             AttributeDelta::add("members", vec![json!("user-1")]),
//!         ],
//!         &OperationOptions::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod group;
pub mod schema;
pub mod validation;

// Re-export commonly used types for convenience
pub use attribute::{AttributeDelta, AttributeSet, DirectoryObject, OperationOptions, Uid};
pub use config::{SyncConfig, SyncConfigBuilder};
pub use error::{EndpointError, SyncError, SyncResult, ValidationError};
pub use group::{GroupFilter, GroupKind, GroupProcessor, ResourceKind};
pub use validation::AttributesValidator;
