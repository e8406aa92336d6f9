//! Error types for launchsim documents.

use thiserror::Error;

/// Errors that can occur while decoding or encoding a room document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// JSON decoding failed
    #[error("malformed room document: {0}")]
    Malformed(#[source] serde_json::Error),

    /// JSON encoding failed
    #[error("failed to encode room document: {0}")]
    Encode(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DocumentError::Malformed(source);
        assert!(err.to_string().starts_with("malformed room document:"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DocumentError>();
    }
}
