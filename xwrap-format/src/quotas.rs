//! Reader quotas and configuration

use crate::error::{ReadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum element nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Limit used for every quota that is unbounded by default
pub const UNBOUNDED: usize = i32::MAX as usize;

/// Resource limits enforced by the document reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderQuotas {
    /// Maximum element nesting depth (default: 32)
    pub max_depth: usize,
    /// Maximum characters in a single text node or attribute value
    pub max_string_content_length: usize,
    /// Maximum child elements read into a single collection
    pub max_array_length: usize,
    /// Maximum bytes a single start tag (name plus attributes) may occupy
    pub max_bytes_per_read: usize,
    /// Maximum total characters across distinct element and attribute names
    pub max_name_table_char_count: usize,
}

impl Default for ReaderQuotas {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_string_content_length: UNBOUNDED,
            max_array_length: UNBOUNDED,
            max_bytes_per_read: UNBOUNDED,
            max_name_table_char_count: UNBOUNDED,
        }
    }
}

impl ReaderQuotas {
    /// Every quota must be positive
    pub fn validate(&self) -> Result<()> {
        for (kind, value) in self.entries() {
            if value == 0 {
                return Err(ReadError::Configuration(format!(
                    "{} quota must be positive",
                    kind
                )));
            }
        }
        Ok(())
    }

    /// Configured limit for a quota
    pub fn limit(&self, kind: QuotaKind) -> usize {
        match kind {
            QuotaKind::MaxDepth => self.max_depth,
            QuotaKind::MaxStringContentLength => self.max_string_content_length,
            QuotaKind::MaxArrayLength => self.max_array_length,
            QuotaKind::MaxBytesPerRead => self.max_bytes_per_read,
            QuotaKind::MaxNameTableCharCount => self.max_name_table_char_count,
        }
    }

    /// Fail with `QuotaExceeded` when `actual` is above the limit for `kind`
    pub fn check(&self, kind: QuotaKind, actual: usize) -> Result<()> {
        let limit = self.limit(kind);
        if actual > limit {
            return Err(ReadError::QuotaExceeded { quota: kind, limit });
        }
        Ok(())
    }

    fn entries(&self) -> [(QuotaKind, usize); 5] {
        [
            (QuotaKind::MaxDepth, self.max_depth),
            (
                QuotaKind::MaxStringContentLength,
                self.max_string_content_length,
            ),
            (QuotaKind::MaxArrayLength, self.max_array_length),
            (QuotaKind::MaxBytesPerRead, self.max_bytes_per_read),
            (
                QuotaKind::MaxNameTableCharCount,
                self.max_name_table_char_count,
            ),
        ]
    }
}

/// Names of the individual reader quotas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaKind {
    /// Element nesting depth
    MaxDepth,
    /// Text or attribute length
    MaxStringContentLength,
    /// Items per collection
    MaxArrayLength,
    /// Bytes per start tag
    MaxBytesPerRead,
    /// Name table characters
    MaxNameTableCharCount,
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuotaKind::MaxDepth => "max depth",
            QuotaKind::MaxStringContentLength => "max string content length",
            QuotaKind::MaxArrayLength => "max array length",
            QuotaKind::MaxBytesPerRead => "max bytes per read",
            QuotaKind::MaxNameTableCharCount => "max name table char count",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let quotas = ReaderQuotas::default();
        assert!(quotas.validate().is_ok());
        assert_eq!(quotas.max_depth, 32);
        assert_eq!(quotas.max_array_length, i32::MAX as usize);
    }

    #[test]
    fn zero_quota_is_configuration_error() {
        let mut quotas = ReaderQuotas::default();
        quotas.max_array_length = 0;
        let err = quotas.validate().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("max array length"));
    }

    #[test]
    fn check_allows_values_at_the_limit() {
        let mut quotas = ReaderQuotas::default();
        quotas.max_depth = 4;
        assert!(quotas.check(QuotaKind::MaxDepth, 4).is_ok());
        let err = quotas.check(QuotaKind::MaxDepth, 5).unwrap_err();
        assert!(matches!(
            err,
            ReadError::QuotaExceeded {
                quota: QuotaKind::MaxDepth,
                limit: 4
            }
        ));
    }
}
