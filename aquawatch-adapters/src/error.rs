//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when reading from a store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The store could not be read (missing file, unreadable source).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The adapter was configured with missing or invalid settings.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(feature = "appwrite")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(AdapterError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            AdapterError::Auth("Invalid credentials".into()).to_string(),
            "Authentication failed: Invalid credentials"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        assert!(matches!(AdapterError::from(err), AdapterError::Parse(_)));
    }
}
