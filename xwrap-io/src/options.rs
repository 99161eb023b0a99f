//! Formatter configuration
//!
//! [`FormatterOptions`] is built once, validated, and shared read-only by
//! every request. [`FormatterConfig`] is its file form.

use crate::wrapper::{WrapperProviderFactory, WrapperProviderRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use xwrap_format::constants::DEFAULT_SUPPORTED_MEDIA_TYPES;
use xwrap_format::{MediaType, ReadError, ReaderQuotas, Result, TextEncoding};

/// Validated formatter settings
#[derive(Debug, Clone)]
pub struct FormatterOptions {
    supported_media_types: Vec<MediaType>,
    supported_encodings: Vec<TextEncoding>,
    quotas: ReaderQuotas,
    registry: WrapperProviderRegistry,
}

impl FormatterOptions {
    /// Start from the defaults
    pub fn builder() -> FormatterOptionsBuilder {
        FormatterOptionsBuilder::default()
    }

    /// Media types accepted, in match order
    pub fn supported_media_types(&self) -> &[MediaType] {
        &self.supported_media_types
    }

    /// Encodings accepted, in preference order
    pub fn supported_encodings(&self) -> &[TextEncoding] {
        &self.supported_encodings
    }

    /// Reader quotas
    pub fn quotas(&self) -> &ReaderQuotas {
        &self.quotas
    }

    /// Wrapper provider factories
    pub fn registry(&self) -> &WrapperProviderRegistry {
        &self.registry
    }
}

impl Default for FormatterOptions {
    fn default() -> Self {
        Self {
            supported_media_types: xwrap_format::default_supported_media_types(),
            supported_encodings: TextEncoding::defaults(),
            quotas: ReaderQuotas::default(),
            registry: WrapperProviderRegistry::with_defaults(),
        }
    }
}

/// Builder for [`FormatterOptions`]
#[derive(Debug, Clone)]
pub struct FormatterOptionsBuilder {
    media_types: Vec<String>,
    encodings: Vec<TextEncoding>,
    quotas: ReaderQuotas,
    registry: WrapperProviderRegistry,
}

impl Default for FormatterOptionsBuilder {
    fn default() -> Self {
        Self {
            media_types: DEFAULT_SUPPORTED_MEDIA_TYPES
                .iter()
                .map(|media| media.to_string())
                .collect(),
            encodings: TextEncoding::defaults(),
            quotas: ReaderQuotas::default(),
            registry: WrapperProviderRegistry::with_defaults(),
        }
    }
}

impl FormatterOptionsBuilder {
    /// Replace the supported media types
    pub fn media_types<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_types = media_types.into_iter().map(Into::into).collect();
        self
    }

    /// Append a supported media type
    pub fn add_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_types.push(media_type.into());
        self
    }

    /// Replace the supported encodings
    pub fn encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Replace all quotas
    pub fn quotas(mut self, quotas: ReaderQuotas) -> Self {
        self.quotas = quotas;
        self
    }

    /// Maximum element nesting depth
    pub fn max_depth(mut self, value: usize) -> Self {
        self.quotas.max_depth = value;
        self
    }

    /// Maximum characters per text node or attribute value
    pub fn max_string_content_length(mut self, value: usize) -> Self {
        self.quotas.max_string_content_length = value;
        self
    }

    /// Maximum child elements per collection
    pub fn max_array_length(mut self, value: usize) -> Self {
        self.quotas.max_array_length = value;
        self
    }

    /// Maximum bytes per start tag
    pub fn max_bytes_per_read(mut self, value: usize) -> Self {
        self.quotas.max_bytes_per_read = value;
        self
    }

    /// Maximum characters across distinct names
    pub fn max_name_table_char_count(mut self, value: usize) -> Self {
        self.quotas.max_name_table_char_count = value;
        self
    }

    /// Replace the factory registry
    pub fn registry(mut self, registry: WrapperProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Append a factory to the registry
    pub fn factory(mut self, factory: Arc<dyn WrapperProviderFactory>) -> Self {
        self.registry.push(factory);
        self
    }

    /// Validate and freeze
    pub fn build(self) -> Result<FormatterOptions> {
        if self.media_types.is_empty() {
            return Err(ReadError::Configuration(
                "supported media types must not be empty".to_string(),
            ));
        }
        if self.encodings.is_empty() {
            return Err(ReadError::Configuration(
                "supported encodings must not be empty".to_string(),
            ));
        }
        self.quotas.validate()?;

        let supported_media_types = self
            .media_types
            .iter()
            .map(|media| MediaType::parse(media))
            .collect::<Result<Vec<_>>>()?;

        Ok(FormatterOptions {
            supported_media_types,
            supported_encodings: self.encodings,
            quotas: self.quotas,
            registry: self.registry,
        })
    }
}

/// File form of the formatter settings
///
/// ```toml
/// supported_media_types = ["application/xml", "text/xml"]
/// supported_encodings = ["utf-8", "utf-16le"]
///
/// [quotas]
/// max_depth = 16
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Media types accepted, in match order
    pub supported_media_types: Vec<String>,
    /// Encodings accepted, in preference order
    pub supported_encodings: Vec<TextEncoding>,
    /// Reader quotas; omitted entries keep their defaults
    pub quotas: ReaderQuotas,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            supported_media_types: DEFAULT_SUPPORTED_MEDIA_TYPES
                .iter()
                .map(|media| media.to_string())
                .collect(),
            supported_encodings: TextEncoding::defaults(),
            quotas: ReaderQuotas::default(),
        }
    }
}

impl FormatterConfig {
    /// Parse TOML text
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| ReadError::Configuration(format!("invalid formatter config: {}", e)))
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading formatter config");
        Self::from_toml_str(&text)
    }

    /// Builder seeded from this config and the default registry
    pub fn into_builder(self) -> FormatterOptionsBuilder {
        FormatterOptions::builder()
            .media_types(self.supported_media_types)
            .encodings(self.supported_encodings)
            .quotas(self.quotas)
    }
}
