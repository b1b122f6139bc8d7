//! Object class descriptors.
//!
//! # Key Types
//!
//! - [`ObjectClassInfo`] - Attributes of one object class
//! - [`AttributeInfo`] - Cardinality, mutability and patch semantics of one attribute
//! - [`PatchSemantics`] - Whether the remote API patches an attribute directly,
//!   only as a whole array, or through reference endpoints
//!
//! # Examples
//!
//! ```rust
//! use directory_sync::schema::{group_object_class, PatchSemantics};
//!
//! let schema = group_object_class();
//! let group_types = schema.attribute("groupTypes").unwrap();
//! assert_eq!(group_types.patch_semantics, PatchSemantics::ReplaceOnly);
//! ```

pub mod group;
pub mod types;

pub use group::{GROUP_OBJECT_CLASS, group_object_class};
pub use types::{AttributeInfo, AttributeInfoBuilder, AttributeType, ObjectClassInfo, PatchSemantics};
