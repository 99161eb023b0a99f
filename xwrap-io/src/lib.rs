//! xwrap I/O - Wrapper providers and the XML input formatter
//!
//! This crate provides the request-facing layer of xwrap:
//!
//! - Wrapper provider traits, the ordered factory registry and the built-in
//!   sequence and error-collection providers
//! - The request abstraction
//! - Formatter options and their TOML form
//! - The read pipeline ([`XmlInputFormatter`])
//!
//! # Example
//!
//! ```rust
//! use xwrap_io::{BufferedRequest, TypeDesc, Value, XmlInputFormatter};
//!
//! let formatter = XmlInputFormatter::default();
//! let mut request = BufferedRequest::new(
//!     Some("application/xml"),
//!     "<ArrayOfArrayOfint><ArrayOfint><int>1</int></ArrayOfint></ArrayOfArrayOfint>",
//! );
//! let declared = TypeDesc::parse("Sequence<Sequence<int>>").unwrap();
//! let value = formatter.read(&mut request, &declared).unwrap();
//! assert_eq!(value, Value::List(vec![Value::from(vec![1])]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod formatter;
mod metrics;
pub mod options;
pub mod request;
pub mod wrapper;

pub use formatter::XmlInputFormatter;
pub use metrics::ReadMetrics;
pub use options::{FormatterConfig, FormatterOptions, FormatterOptionsBuilder};
pub use request::{BufferedRequest, InputRequest, StreamRequest};
pub use wrapper::{
    WrapperProvider, WrapperProviderContext, WrapperProviderFactory, WrapperProviderRegistry,
};

// Re-export commonly used types
pub use xwrap_codec::{DocumentReader, DocumentSerializer, ReaderStats};
pub use xwrap_format::{
    MediaType, QuotaKind, ReadError, ReaderQuotas, Result, TextEncoding, TypeDesc, Value,
};
