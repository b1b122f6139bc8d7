//! Synchronization configuration.
//!
//! [`SyncConfig`] carries the settings every component needs: where absolute
//! references point, the reference namespaces for relationship targets, and
//! pagination defaults. It is built explicitly (defaults, builder, or JSON) and
//! handed to an [`EndpointContext`](crate::endpoint::EndpointContext); there is
//! no process-wide configuration.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};

/// Largest page size the remote API accepts for `$top`.
pub const MAX_PAGE_SIZE: u32 = 999;

/// Configuration for group synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Prefix of absolute references posted to reference endpoints.
    /// Example: `https://graph.microsoft.com/v1.0`
    pub reference_base_url: String,

    /// Reference namespace for group members (any directory object).
    pub member_namespace: String,

    /// Reference namespace for group owners (users only).
    pub owner_namespace: String,

    /// `$top` used for paginated list requests.
    pub page_size: u32,

    /// Fields requested when listing members or owners for saturation.
    pub saturation_select: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reference_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            member_namespace: "directoryObjects".to_string(),
            owner_namespace: "users".to_string(),
            page_size: 100,
            saturation_select: vec!["id".to_string(), "userPrincipalName".to_string()],
        }
    }
}

impl SyncConfig {
    /// Start a builder seeded with the defaults.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(input: &str) -> SyncResult<Self> {
        let config: SyncConfig = serde_json::from_str(input)
            .map_err(|e| SyncError::configuration(format!("Malformed configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Build the absolute reference of a foreign object.
    ///
    /// Example: `https://graph.microsoft.com/v1.0/users/{id}`
    pub fn reference_url(&self, namespace: &str, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.reference_base_url.trim_end_matches('/'),
            namespace,
            id
        )
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.reference_base_url.is_empty() {
            return Err(SyncError::configuration("Reference base URL cannot be empty"));
        }

        if !self.reference_base_url.starts_with("http://")
            && !self.reference_base_url.starts_with("https://")
        {
            return Err(SyncError::configuration(
                "Reference base URL must start with http:// or https://",
            ));
        }

        if self.member_namespace.is_empty() || self.owner_namespace.is_empty() {
            return Err(SyncError::configuration("Reference namespaces cannot be empty"));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(SyncError::configuration(format!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        if self.saturation_select.is_empty() {
            return Err(SyncError::configuration("Saturation select list cannot be empty"));
        }

        Ok(())
    }
}

/// Fluent builder for [`SyncConfig`].
///
/// ```rust
/// use directory_sync::SyncConfig;
///
/// let config = SyncConfig::builder()
///     .with_reference_base_url("https://graph.microsoft.us/v1.0")
///     .with_page_size(50)
///     .build()
///     .unwrap();
/// assert_eq!(config.page_size, 50);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn with_reference_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.reference_base_url = url.into();
        self
    }

    pub fn with_member_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.member_namespace = namespace.into();
        self
    }

    pub fn with_owner_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.owner_namespace = namespace.into();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn with_saturation_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.saturation_select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> SyncResult<SyncConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
