//! Directory error types.

use thiserror::Error;

/// Errors that can occur when reading from the user directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The page could not be fetched (transport, auth or throttling).
    #[error("Directory unavailable ({code}): {message}")]
    SourceUnavailable { code: String, message: String },

    /// A record has no usable `email` attribute.
    #[error(
        "User {} has no email attribute",
        .username.as_deref().unwrap_or("<unknown>")
    )]
    MissingEmailAttribute { username: Option<String> },

    /// The pool identifier is malformed.
    #[error("Invalid user pool id '{0}': expected <region>_<id>")]
    InvalidPoolId(String),
}

impl DirectoryError {
    /// Create a source-unavailable error.
    #[inline]
    pub fn unavailable(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Provider error code, used in per-attempt failure reports.
    pub fn code(&self) -> &str {
        match self {
            Self::SourceUnavailable { code, .. } => code,
            Self::MissingEmailAttribute { .. } => "MissingEmailAttribute",
            Self::InvalidPoolId(_) => "InvalidPoolId",
        }
    }
}

/// Result type for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;
