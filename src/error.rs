//! Error types for the warden application surface

use thiserror::Error;
use warden_core_restrict::RestrictError;

/// Result type for warden application operations
pub type Result<T> = std::result::Result<T, WardenError>;

/// Errors raised outside the restriction core (configuration, bootstrap)
#[derive(Error, Debug)]
pub enum WardenError {
    /// Configuration is missing, unreadable, or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A restriction-core error bubbled up unchanged
    #[error(transparent)]
    Restrict(#[from] RestrictError),
}

impl WardenError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        WardenError::Config(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = WardenError::config("sweep interval must be positive");
        assert!(matches!(err, WardenError::Config(_)));
        assert!(err.to_string().contains("sweep interval"));
    }

    #[test]
    fn test_restrict_error_is_transparent() {
        let entity = uuid::Uuid::new_v4();
        let err: WardenError = RestrictError::NotRestricted(entity).into();
        assert!(err.to_string().contains(&entity.to_string()));
    }
}
