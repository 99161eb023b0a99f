//! Inbound request abstraction

use std::fmt;
use std::io::{Cursor, Read};
use xwrap_format::{ReadError, Result};

/// What the read pipeline needs from a host request
pub trait InputRequest {
    /// Declared content type, if any
    fn content_type(&self) -> Option<&str>;

    /// Declared body length; `None` when unknown (chunked bodies)
    fn content_length(&self) -> Option<u64>;

    /// Hand over the body stream; a body can be taken once
    fn take_body(&mut self) -> Result<Box<dyn Read + Send>>;
}

/// In-memory request
#[derive(Debug, Clone, Default)]
pub struct BufferedRequest {
    content_type: Option<String>,
    content_length: Option<u64>,
    body: Option<Vec<u8>>,
}

impl BufferedRequest {
    /// Request with a body; the content length is the body length
    pub fn new(content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            content_type: content_type.map(str::to_string),
            content_length: Some(body.len() as u64),
            body: Some(body),
        }
    }

    /// Override the declared length (`None` for an unknown length)
    pub fn with_content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }
}

impl InputRequest for BufferedRequest {
    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn take_body(&mut self) -> Result<Box<dyn Read + Send>> {
        let body = self.body.take().ok_or_else(body_taken)?;
        Ok(Box::new(Cursor::new(body)))
    }
}

/// Request over an arbitrary stream
pub struct StreamRequest<R> {
    content_type: Option<String>,
    content_length: Option<u64>,
    body: Option<R>,
}

impl<R: Read + Send + 'static> StreamRequest<R> {
    /// Request reading its body from `body`
    pub fn new(content_type: Option<&str>, content_length: Option<u64>, body: R) -> Self {
        Self {
            content_type: content_type.map(str::to_string),
            content_length,
            body: Some(body),
        }
    }

    /// Whether the body is still held by the request
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

impl<R: Read + Send + 'static> InputRequest for StreamRequest<R> {
    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn take_body(&mut self) -> Result<Box<dyn Read + Send>> {
        let body = self.body.take().ok_or_else(body_taken)?;
        Ok(Box::new(body))
    }
}

impl<R> fmt::Debug for StreamRequest<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamRequest")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

fn body_taken() -> ReadError {
    ReadError::Configuration("request body already taken".to_string())
}
