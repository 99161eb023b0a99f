//! XML input formatter: the read pipeline
//!
//! One forward pass per request:
//!
//! 1. Match the request content type against the supported media types.
//! 2. A body of length zero yields the target type's default.
//! 3. Resolve a wrapper provider and read the effective type through a
//!    quota-bounded reader, which releases the body on every exit path.
//! 4. Unwrap a surrogate result back to the target type.

use crate::metrics::{ReadMeasurement, ReadMetrics};
use crate::options::FormatterOptions;
use crate::request::InputRequest;
use crate::wrapper::{WrapperProvider, WrapperProviderContext};
use std::sync::Arc;
use xwrap_codec::{DocumentReader, DocumentSerializer};
use xwrap_format::{
    declared_encoding, match_media_type, unwrap_value, MediaType, ReadError, Result, TypeDesc,
    Value,
};

/// Reads XML request bodies into values of a declared type
#[derive(Debug, Clone, Default)]
pub struct XmlInputFormatter {
    options: Arc<FormatterOptions>,
}

impl XmlInputFormatter {
    /// Create a formatter owning `options`
    pub fn new(options: FormatterOptions) -> Self {
        Self::from_shared(Arc::new(options))
    }

    /// Create a formatter over shared options
    pub fn from_shared(options: Arc<FormatterOptions>) -> Self {
        Self { options }
    }

    /// Settings in use
    pub fn options(&self) -> &FormatterOptions {
        &self.options
    }

    /// Whether the request's content type is supported
    pub fn can_read(&self, request: &dyn InputRequest) -> bool {
        self.negotiate(request.content_type()).is_some()
    }

    /// Whether `declared` can be read, directly or through a surrogate
    pub fn can_read_type(&self, declared: &TypeDesc) -> bool {
        match self.effective_type(declared) {
            Ok(effective) => DocumentSerializer::supports(&effective),
            Err(err) => {
                tracing::debug!(declared = %declared, error = %err, "type cannot be read");
                false
            }
        }
    }

    /// Provider the registry offers for reading `declared`
    pub fn resolve_provider(&self, declared: &TypeDesc) -> Result<Option<Arc<dyn WrapperProvider>>> {
        self.options
            .registry()
            .resolve(&WrapperProviderContext::for_read(declared.clone()))
    }

    /// Type the serializer will target for `declared`
    pub fn effective_type(&self, declared: &TypeDesc) -> Result<TypeDesc> {
        Ok(match self.resolve_provider(declared)? {
            Some(provider) => provider.wrapping_type().clone(),
            None => declared.clone(),
        })
    }

    /// Read the request body as `declared`
    pub fn read(&self, request: &mut dyn InputRequest, declared: &TypeDesc) -> Result<Value> {
        self.read_with_metrics(request, declared)
            .map(|(value, _)| value)
    }

    /// Read the request body as `declared` and report what the read cost
    pub fn read_with_metrics(
        &self,
        request: &mut dyn InputRequest,
        declared: &TypeDesc,
    ) -> Result<(Value, ReadMetrics)> {
        let measurement = ReadMeasurement::begin();

        let content_type = request.content_type().map(str::to_string);
        let media = self.negotiate(content_type.as_deref()).ok_or_else(|| {
            tracing::warn!(content_type = ?content_type, "unsupported media type");
            ReadError::UnsupportedMediaType {
                content_type: content_type.clone().unwrap_or_default(),
            }
        })?;
        tracing::debug!(media = %media, declared = %declared, "media type accepted");

        if request.content_length() == Some(0) {
            tracing::debug!(declared = %declared, "empty body, returning default");
            return Ok((declared.default_value(), measurement.finish_empty()));
        }

        let provider = self.resolve_provider(declared)?;
        let effective = match &provider {
            Some(provider) => provider.wrapping_type().clone(),
            None => declared.clone(),
        };
        let serializer = DocumentSerializer::new(effective.clone())?;
        tracing::debug!(effective = %effective, wrapped = provider.is_some(), "reading document");

        let charset = content_type
            .as_deref()
            .and_then(|ct| MediaType::parse(ct).ok())
            .and_then(|request_media| request_media.charset().map(str::to_string));
        let encoding =
            declared_encoding(charset.as_deref(), self.options.supported_encodings())?;

        let (value, stats) = {
            let body = request.take_body()?;
            let mut reader = DocumentReader::new(
                body,
                encoding,
                self.options.supported_encodings(),
                self.options.quotas().clone(),
            )?;
            let value = serializer.read_object(&mut reader);
            (value, reader.stats())
        };
        let value = value?;

        let value = if provider.is_some() && effective != *declared {
            unwrap_value(value, declared)?
        } else {
            value
        };

        Ok((value, measurement.finish(stats, provider.is_some())))
    }

    /// Read from an async body
    ///
    /// The content type is checked before any byte is read. The body is
    /// buffered, then handed to the synchronous pipeline; a body that turns
    /// out empty takes the default-value path.
    #[cfg(feature = "async")]
    pub async fn read_async<B>(
        &self,
        content_type: Option<&str>,
        mut body: B,
        declared: &TypeDesc,
    ) -> Result<Value>
    where
        B: tokio::io::AsyncRead + Unpin + Send,
    {
        use tokio::io::AsyncReadExt;

        if self.negotiate(content_type).is_none() {
            tracing::warn!(content_type = ?content_type, "unsupported media type");
            return Err(ReadError::UnsupportedMediaType {
                content_type: content_type.unwrap_or_default().to_string(),
            });
        }

        let mut bytes = Vec::new();
        body.read_to_end(&mut bytes).await?;
        let mut request = crate::request::BufferedRequest::new(content_type, bytes);
        self.read(&mut request, declared)
    }

    fn negotiate(&self, content_type: Option<&str>) -> Option<&MediaType> {
        match_media_type(content_type, self.options.supported_media_types())
    }
}
