//! Error types for the compliance gate

use thiserror::Error;

/// Main error type for compliance gate operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Activation was requested twice with different policy content
    #[error("activation conflict: {0}")]
    ActivationConflict(String),

    /// The linked crypto library cannot honor the approved sets
    #[error("platform unsupported: {0}")]
    PlatformUnsupported(String),

    /// A TLS parameter outside the approved sets was requested
    #[error("non-compliant TLS configuration: {0}")]
    NonCompliantConfiguration(String),

    /// A restricted configuration was requested before activation
    #[error("compliance gate not active: {0}")]
    Inactive(String),

    /// TLS library error
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),
}

impl Error {
    /// Create an activation conflict error with the given message
    pub fn activation_conflict(msg: impl Into<String>) -> Self {
        Self::ActivationConflict(msg.into())
    }

    /// Create a platform unsupported error with the given message
    pub fn platform_unsupported(msg: impl Into<String>) -> Self {
        Self::PlatformUnsupported(msg.into())
    }

    /// Create a non-compliant configuration error with the given message
    pub fn non_compliant(msg: impl Into<String>) -> Self {
        Self::NonCompliantConfiguration(msg.into())
    }

    /// Create an inactive gate error with the given message
    pub fn inactive(msg: impl Into<String>) -> Self {
        Self::Inactive(msg.into())
    }
}
