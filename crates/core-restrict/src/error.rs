//! Error types for restriction operations

use thiserror::Error;
use uuid::Uuid;

/// Result type for restriction operations
pub type Result<T> = std::result::Result<T, RestrictError>;

/// Errors that can occur during restriction operations
///
/// Everything except [`RestrictError::ConsistencyViolation`] is an expected
/// business outcome: callers branch on these values to decide user-facing
/// messaging. A `ConsistencyViolation` indicates an engine bug and should be
/// surfaced loudly, never silently repaired.
#[derive(Error, Debug)]
pub enum RestrictError {
    /// The entity already has an active restriction of this kind
    #[error("entity {0} already has an active restriction of this kind")]
    AlreadyRestricted(Uuid),

    /// The entity has no active restriction of this kind
    #[error("entity {0} has no active restriction of this kind")]
    NotRestricted(Uuid),

    /// No jail site with this name exists
    #[error("no jail site named '{0}'")]
    JailNotFound(String),

    /// The entity is already confined to a jail
    #[error("entity {0} is already confined")]
    AlreadyConfined(Uuid),

    /// The entity is not confined to any jail
    #[error("entity {0} is not confined")]
    NotConfined(Uuid),

    /// A duration was non-positive or unparsable
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// An operation referenced an entity the caller could not resolve.
    /// Reserved for API layers that map names to ids before calling in.
    #[error("unknown entity {0}")]
    EntityUnknown(Uuid),

    /// The state journal failed to load or persist a record
    #[error("journal error: {0}")]
    Journal(String),

    /// Internal invariants were violated - this is a defect, not a state conflict
    #[error("consistency violation: {0}")]
    ConsistencyViolation(String),
}

impl RestrictError {
    /// Create a journal error
    pub fn journal<S: Into<String>>(message: S) -> Self {
        RestrictError::Journal(message.into())
    }

    /// Create an invalid duration error
    pub fn invalid_duration<S: Into<String>>(message: S) -> Self {
        RestrictError::InvalidDuration(message.into())
    }

    /// Create a consistency violation error
    pub fn consistency<S: Into<String>>(message: S) -> Self {
        RestrictError::ConsistencyViolation(message.into())
    }

    /// True for state-conflict outcomes a caller is expected to handle
    pub fn is_expected(&self) -> bool {
        !matches!(self, RestrictError::ConsistencyViolation(_))
    }
}
