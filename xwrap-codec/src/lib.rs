//! xwrap Codec - Quota-bounded document reader and type-directed serializer
//!
//! This crate turns a request body into a [`Value`]:
//!
//! - Encoding selection and normalization to UTF-8
//! - XML tokenization with every reader quota enforced
//! - Element-tree construction
//! - Deserialization of concrete types, surrogates included

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod reader;
pub mod serializer;
pub mod tree;

pub use decode::DecodedStream;
pub use reader::{DocumentReader, ReaderStats};
pub use serializer::DocumentSerializer;
pub use tree::{Attribute, Element};

// Re-export commonly used types
pub use xwrap_format::{ReadError, ReaderQuotas, Result, TextEncoding, TypeDesc, Value};
