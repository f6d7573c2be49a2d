//! Error types for cloudlens navigation and view dispatch

use thiserror::Error;

/// Main error type for cloudlens operations
#[derive(Error, Debug)]
pub enum LensError {
    /// Mnemonic is neither reserved nor present in the alias store
    #[error("`{0}` command not found")]
    CommandNotFound(String),

    /// Viewer factory produced nothing for the resource
    #[error("No component found for {0}")]
    NoComponent(String),

    /// Component initialization failed
    #[error("Failed to initialize {component}: {reason}")]
    Init { component: String, reason: String },

    /// Alias store could not be loaded or written
    #[error("Alias store error: {0}")]
    AliasStore(String),

    /// A user alias entry was rejected
    #[error("Malformed alias '{mnemonic}': {reason}")]
    MalformedAlias { mnemonic: String, reason: String },

    /// Data source fetch failed
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// The root frame cannot be popped
    #[error("Cannot pop the root view")]
    RootFrame,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for LensError {
    fn from(err: toml::de::Error) -> Self {
        LensError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for LensError {
    fn from(err: toml::ser::Error) -> Self {
        LensError::Serialization(err.to_string())
    }
}

/// Result type alias for cloudlens operations
pub type LensResult<T> = Result<T, LensError>;
