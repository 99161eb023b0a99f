//! Body decoding: encoding selection, BOM stripping and UTF-16LE transcoding
//!
//! The XML tokenizer only consumes UTF-8, so every body is normalized here
//! before it reaches the reader.

use std::cmp::min;
use std::io::{self, Read};
use xwrap_format::{ReadError, Result, TextEncoding};

const CHUNK_SIZE: usize = 4096;

/// Byte stream presenting a request body as UTF-8
pub struct DecodedStream<R> {
    inner: R,
    encoding: TextEncoding,
    head: Vec<u8>,
    head_pos: usize,
    pending: Vec<u8>,
    pending_pos: usize,
    carry: Option<u8>,
    high_surrogate: Option<u16>,
    raw_bytes: u64,
}

impl<R: Read> DecodedStream<R> {
    /// Wrap a body stream
    ///
    /// `declared` is the encoding named by the request charset. Without one,
    /// a leading byte-order mark picks the encoding if it is supported;
    /// otherwise the first supported encoding is used.
    pub fn new(
        mut inner: R,
        declared: Option<TextEncoding>,
        supported: &[TextEncoding],
    ) -> Result<Self> {
        let fallback = supported.first().copied().ok_or_else(|| {
            ReadError::Configuration("no supported encodings configured".to_string())
        })?;

        let mut head = Vec::with_capacity(3);
        let mut bom_buf = [0u8; 3];
        while head.len() < bom_buf.len() {
            let n = inner.read(&mut bom_buf[..3 - head.len()])?;
            if n == 0 {
                break;
            }
            head.extend_from_slice(&bom_buf[..n]);
        }
        let raw_bytes = head.len() as u64;

        let sniffed = TextEncoding::sniff(&head).filter(|enc| supported.contains(enc));
        let encoding = declared.or(sniffed).unwrap_or(fallback);

        let mut head_pos = 0;
        if head.starts_with(encoding.bom()) {
            head_pos = encoding.bom().len();
        }

        Ok(Self {
            inner,
            encoding,
            head,
            head_pos,
            pending: Vec::new(),
            pending_pos: 0,
            carry: None,
            high_surrogate: None,
            raw_bytes,
        })
    }

    /// Encoding in effect
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Bytes consumed from the underlying stream so far
    pub fn raw_bytes(&self) -> u64 {
        self.raw_bytes
    }

    fn read_raw(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.head_pos < self.head.len() {
            let n = min(buf.len(), self.head.len() - self.head_pos);
            buf[..n].copy_from_slice(&self.head[self.head_pos..self.head_pos + n]);
            self.head_pos += n;
            return Ok(n);
        }
        let n = self.inner.read(buf)?;
        self.raw_bytes += n as u64;
        Ok(n)
    }

    /// Decode the next chunk of UTF-16LE into `pending`; false at end of input
    fn fill_utf16(&mut self) -> io::Result<bool> {
        let mut raw = [0u8; CHUNK_SIZE];
        let n = self.read_raw(&mut raw)?;
        if n == 0 {
            if self.carry.is_some() || self.high_surrogate.is_some() {
                return Err(invalid_data("truncated UTF-16 sequence"));
            }
            return Ok(false);
        }

        let mut bytes = Vec::with_capacity(n + 1);
        if let Some(byte) = self.carry.take() {
            bytes.push(byte);
        }
        bytes.extend_from_slice(&raw[..n]);
        if bytes.len() % 2 == 1 {
            self.carry = bytes.pop();
        }

        let mut units: Vec<u16> = Vec::with_capacity(bytes.len() / 2 + 1);
        if let Some(high) = self.high_surrogate.take() {
            units.push(high);
        }
        units.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
        );
        if matches!(units.last(), Some(unit) if (0xD800..0xDC00).contains(unit)) {
            self.high_surrogate = units.pop();
        }

        self.pending.clear();
        self.pending_pos = 0;
        let mut utf8 = [0u8; 4];
        for decoded in char::decode_utf16(units) {
            let ch = decoded.map_err(|e| invalid_data(&e.to_string()))?;
            self.pending
                .extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
        }
        Ok(true)
    }
}

impl<R: Read> Read for DecodedStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.encoding {
            TextEncoding::Utf8 => self.read_raw(buf),
            TextEncoding::Utf16Le => loop {
                if self.pending_pos < self.pending.len() {
                    let n = min(buf.len(), self.pending.len() - self.pending_pos);
                    buf[..n].copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                    self.pending_pos += n;
                    return Ok(n);
                }
                if !self.fill_utf16()? {
                    return Ok(0);
                }
            },
        }
    }
}

fn invalid_data(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}
