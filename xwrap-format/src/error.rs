//! Error types for xwrap

use crate::quotas::QuotaKind;
use thiserror::Error;

/// Errors surfaced by wrapper resolution and the read pipeline
#[derive(Debug, Error)]
pub enum ReadError {
    /// Request content type did not match any supported media type.
    #[error("Unsupported media type: '{content_type}'")]
    UnsupportedMediaType {
        /// Content type declared by the request (empty when absent)
        content_type: String,
    },
    /// Request charset is not one of the supported encodings.
    #[error("Unsupported encoding: '{charset}'")]
    UnsupportedEncoding {
        /// Charset named by the request
        charset: String,
    },
    /// A wrapper was asked to adapt a type that does not have its required shape.
    #[error("Invalid shape for '{type_name}': {reason}")]
    InvalidShape {
        /// Display name of the offending declared type
        type_name: String,
        /// Why the type was rejected
        reason: String,
    },
    /// The document reader met syntax or content it cannot parse.
    #[error("Malformed document at byte {position}: {message}")]
    MalformedDocument {
        /// Parser message
        message: String,
        /// Byte offset in the decoded document
        position: u64,
    },
    /// A reader quota was exceeded.
    #[error("Quota exceeded: {quota} limit of {limit}")]
    QuotaExceeded {
        /// Which quota tripped
        quota: QuotaKind,
        /// Configured limit
        limit: usize,
    },
    /// Setup fault: empty required list, bad quota, unconstructible type.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A value handed to wrap or unwrap does not have the expected shape.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape
        found: String,
    },
    /// I/O operation failed while reading the request body.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// Build a `MalformedDocument` error
    pub fn malformed(message: impl Into<String>, position: u64) -> Self {
        ReadError::MalformedDocument {
            message: message.into(),
            position,
        }
    }

    /// True for `QuotaExceeded`, so hosts can map it to a "payload too large" response
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ReadError::QuotaExceeded { .. })
    }

    /// True for errors caused by setup rather than by the inbound document
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ReadError::Configuration(_) | ReadError::InvalidShape { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ReadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_errors_are_distinguishable() {
        let err = ReadError::QuotaExceeded {
            quota: QuotaKind::MaxDepth,
            limit: 32,
        };
        assert!(err.is_quota_exceeded());
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "Quota exceeded: max depth limit of 32");
    }

    #[test]
    fn malformed_reports_position() {
        let err = ReadError::malformed("unexpected end tag", 17);
        assert_eq!(
            err.to_string(),
            "Malformed document at byte 17: unexpected end tag"
        );
        assert!(!err.is_quota_exceeded());
    }
}
