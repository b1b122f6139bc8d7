//! Error types for group synchronization.
//!
//! Failures are layered: the directory endpoint reports [`EndpointError`],
//! attribute checks report [`ValidationError`], and every public operation
//! returns [`SyncError`], which wraps the other two without reinterpreting them.

/// Errors reported by a directory endpoint.
///
/// These are passed through to callers unchanged inside [`SyncError::Remote`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EndpointError {
    /// The addressed resource or reference does not exist
    #[error("Resource not found: {path}")]
    NotFound { path: String },

    /// The write conflicts with existing state (e.g. reference already present)
    #[error("Conflict at {path}: {message}")]
    Conflict { path: String, message: String },

    /// The request was rejected as malformed
    #[error("Bad request to {path}: {message}")]
    BadRequest { path: String, message: String },

    /// Any other non-success answer
    #[error("Remote error {status} ({code}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    /// The response body could not be interpreted
    #[error("JSON error: {0}")]
    Json(String),
}

impl EndpointError {
    /// Create a not-found error for a path
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a conflict error
    pub fn conflict(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a bad-request error
    pub fn bad_request(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for EndpointError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

/// Attribute-level validation failures, raised before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required attribute is missing or empty
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Attribute is not part of the object class
    #[error("Unknown attribute '{attribute}' for object class '{object_class}'")]
    UnknownAttribute {
        attribute: String,
        object_class: String,
    },

    /// Attribute cannot be written by clients
    #[error("Attribute '{attribute}' is read-only and cannot be modified")]
    ReadOnlyAttribute { attribute: String },

    /// Add/remove requested on an attribute that is only ever replaced
    #[error("Attribute '{attribute}' does not accept add/remove values, only a replacement")]
    IncrementalDelta { attribute: String },

    /// Replacement requested on an attribute that only takes add/remove values
    #[error("Attribute '{attribute}' only accepts add/remove values, not a replacement")]
    ReplacementDelta { attribute: String },

    /// One delta carries both a replacement and add/remove values
    #[error("Delta for attribute '{attribute}' mixes a replacement with add/remove values")]
    MixedDelta { attribute: String },

    /// Value has the wrong shape for the attribute
    #[error("Attribute '{attribute}' has invalid type, expected {expected}, got {actual}")]
    InvalidAttributeType {
        attribute: String,
        expected: String,
        actual: String,
    },
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an unknown attribute error
    pub fn unknown_attribute(attribute: impl Into<String>, object_class: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.into(),
            object_class: object_class.into(),
        }
    }

    /// Create a read-only attribute error
    pub fn read_only(attribute: impl Into<String>) -> Self {
        Self::ReadOnlyAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid type error
    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidAttributeType {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Main error type for group synchronization operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Attribute validation failed before any remote call was made
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The pre-create name check found an existing resource
    #[error("Another object with the same value for property {attribute} already exists: '{value}'")]
    AlreadyExists { attribute: String, value: String },

    /// The directory endpoint answered with a failure
    #[error("Remote error: {0}")]
    Remote(#[from] EndpointError),

    /// The caller passed an unusable argument
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The endpoint answered successfully but the body is unusable
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration is incomplete or inconsistent
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },
}

impl SyncError {
    /// Create an already-exists error
    pub fn already_exists(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::AlreadyExists {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the endpoint reported the target as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(EndpointError::NotFound { .. }))
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
pub type EndpointResult<T> = Result<T, EndpointError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
