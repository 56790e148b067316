//! Error types module
//!
//! All errors crossing a service boundary are unified under the `AppError`
//! enum. The boundary layer (HTTP or otherwise) is out of scope here, so each
//! variant self-describes how it should be presented through the
//! `ErrorMetadata` trait instead of depending on any HTTP types.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like lookups of absent records
    Debug,
    /// Warning level - for degraded but recoverable situations
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their response characteristics
/// without the core depending on an HTTP layer.
pub trait ErrorMetadata {
    /// HTTP-equivalent status code for the boundary layer
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "CORRUPT_CONTAINER")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid range: {start}..={end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("Corrupt container: {0}")]
    CorruptContainer(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Stream failure: {0}")]
    StreamFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, LogLevel) {
    match err {
        AppError::NotFound(_) => (404, "NOT_FOUND", LogLevel::Debug),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", LogLevel::Debug),
        AppError::InvalidRange { .. } => (400, "INVALID_RANGE", LogLevel::Debug),
        AppError::CorruptContainer(_) => (500, "CORRUPT_CONTAINER", LogLevel::Error),
        AppError::Crypto(_) => (500, "CRYPTO_ERROR", LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", LogLevel::Error),
        AppError::StreamFailure(_) => (500, "STREAM_FAILURE", LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", LogLevel::Error),
    }
}

impl AppError {
    /// Get detailed error information including the source chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::InvalidRange { start, end } => {
                format!("Invalid byte range: {}..={}", start, end)
            }
            AppError::CorruptContainer(_) => "Stored file is corrupt".to_string(),
            AppError::Crypto(_) => "Encryption failure".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::StreamFailure(_) => "Transfer interrupted".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("file resource not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.client_message(), "file resource not found");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_invalid_range() {
        let err = AppError::InvalidRange { start: 10, end: 5 };
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_RANGE");
        assert!(err.client_message().contains("10"));
        assert!(err.client_message().contains("5"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_corrupt_container() {
        let err = AppError::CorruptContainer("container shorter than header".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "CORRUPT_CONTAINER");
        assert_eq!(err.client_message(), "Stored file is corrupt");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("disk on fire");
        let err = AppError::InternalWithSource {
            message: "upload failed".to_string(),
            source,
        };
        let details = err.detailed_message();
        assert!(details.contains("Caused by: disk on fire"));
    }
}
