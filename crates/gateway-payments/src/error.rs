//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Request body or path parameter failed validation
    #[error("{0}")]
    Validation(String),

    /// Intent is not in the stage the requested transition needs
    #[error("PaymentIntent cannot be {action} in its current state, State: {actual}")]
    InvalidState {
        action: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// Provider rejected the call (includes unknown intent ids)
    #[error("Failed to {action}: {message}")]
    Provider {
        action: &'static str,
        message: String,
    },

    /// Required credential absent from the environment
    #[error("{0} not set")]
    MissingCredential(&'static str),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider object could not be mapped
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PaymentError {
    /// Wrap a provider failure with the operation that failed
    pub fn provider(action: &'static str, err: impl std::fmt::Display) -> Self {
        PaymentError::Provider {
            action,
            message: err.to_string(),
        }
    }

    /// Whether the caller is at fault (maps to a 4xx response)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaymentError::Validation(_) | PaymentError::InvalidState { .. }
        )
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Validation(_) => "INVALID_REQUEST",
            PaymentError::InvalidState { .. } => "INVALID_STATE",
            PaymentError::Provider { .. } | PaymentError::Serialization(_) => "PROVIDER_ERROR",
            PaymentError::MissingCredential(_) | PaymentError::Config(_) => "CONFIGURATION_ERROR",
        }
    }
}
