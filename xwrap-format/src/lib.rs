//! xwrap Format - Core primitives for surrogate-type adaptation
//!
//! This crate provides the building blocks shared by the document reader and
//! the input formatter, with no I/O dependencies. It includes:
//!
//! - Runtime type descriptors
//! - Dynamic values and surrogate instances
//! - Reader quotas
//! - Media type matching
//! - Text encodings
//! - Error types

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod encoding;
pub mod error;
pub mod media;
pub mod quotas;
pub mod surrogate;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use encoding::{declared_encoding, TextEncoding};
pub use error::{ReadError, Result};
pub use media::{match_media_type, MediaType};
pub use quotas::{QuotaKind, ReaderQuotas};
pub use surrogate::{
    surrogate_value, unwrap_value, Surrogate, SurrogateCtor, SurrogateDesc, SurrogateItem,
    SurrogateShape,
};
pub use types::{FieldDesc, InterfaceDesc, InterfaceKind, RecordDesc, TypeDesc};
pub use value::{ErrorMap, Record, SurrogateValue, Value};

/// Media types accepted by default, parsed
pub fn default_supported_media_types() -> Vec<MediaType> {
    constants::DEFAULT_SUPPORTED_MEDIA_TYPES
        .iter()
        .filter_map(|media| MediaType::parse(media).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_media_types_parse() {
        let media = default_supported_media_types();
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].essence(), "application/xml");
        assert_eq!(media[1].essence(), "text/xml");
    }
}
