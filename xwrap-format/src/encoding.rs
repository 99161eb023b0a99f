//! Text encodings accepted for request bodies

use crate::constants::{UTF16LE_BOM, UTF8_BOM};
use crate::error::{ReadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported body encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8, byte-order mark optional
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// UTF-16 little-endian
    #[serde(rename = "utf-16le", alias = "utf-16")]
    Utf16Le,
}

impl TextEncoding {
    /// Default encodings, in preference order
    pub fn defaults() -> Vec<TextEncoding> {
        vec![TextEncoding::Utf8, TextEncoding::Utf16Le]
    }

    /// Canonical label
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
        }
    }

    /// Resolve a charset label (case-insensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().trim_matches('"').to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(TextEncoding::Utf8),
            "utf-16" | "utf-16le" | "utf16" | "unicode" => Some(TextEncoding::Utf16Le),
            _ => None,
        }
    }

    /// Byte-order mark for this encoding
    pub fn bom(&self) -> &'static [u8] {
        match self {
            TextEncoding::Utf8 => &UTF8_BOM,
            TextEncoding::Utf16Le => &UTF16LE_BOM,
        }
    }

    /// Detect an encoding from a leading byte-order mark
    pub fn sniff(prefix: &[u8]) -> Option<Self> {
        if prefix.starts_with(&UTF8_BOM) {
            Some(TextEncoding::Utf8)
        } else if prefix.starts_with(&UTF16LE_BOM) {
            Some(TextEncoding::Utf16Le)
        } else {
            None
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding named by the request's charset, checked against the supported list
///
/// Returns `None` when the request names no charset; detection then falls to
/// the document reader.
pub fn declared_encoding(
    charset: Option<&str>,
    supported: &[TextEncoding],
) -> Result<Option<TextEncoding>> {
    let charset = match charset {
        Some(charset) => charset,
        None => return Ok(None),
    };

    match TextEncoding::from_label(charset) {
        Some(encoding) if supported.contains(&encoding) => Ok(Some(encoding)),
        _ => Err(ReadError::UnsupportedEncoding {
            charset: charset.to_string(),
        }),
    }
}
