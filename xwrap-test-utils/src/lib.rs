//! xwrap Test Utilities
//!
//! Shared fixtures for the xwrap crates: instrumented body streams and
//! builders for data-contract shaped documents.

use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use xwrap_format::constants::XSI_NAMESPACE;
use xwrap_format::{TypeDesc, Value};

/// Body stream that counts how many times it is dropped
pub struct DropCounter<R> {
    inner: R,
    drops: Arc<AtomicUsize>,
}

impl<R: Read> DropCounter<R> {
    /// Wrap `inner`; the returned counter observes drops
    pub fn new(inner: R) -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner,
                drops: drops.clone(),
            },
            drops,
        )
    }
}

impl<R: Read> Read for DropCounter<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R> Drop for DropCounter<R> {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Body stream that fails once `fail_after` bytes have been served, or at
/// the end of `data` if that comes first
pub struct FailingReader {
    data: Vec<u8>,
    position: usize,
    fail_after: usize,
}

impl FailingReader {
    /// Serve `data`, failing after `fail_after` bytes
    pub fn new(data: impl Into<Vec<u8>>, fail_after: usize) -> Self {
        Self {
            data: data.into(),
            position: 0,
            fail_after,
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.fail_after {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        let end = self
            .data
            .len()
            .min(self.fail_after)
            .min(self.position + buf.len());
        let n = end.saturating_sub(self.position);
        buf[..n].copy_from_slice(&self.data[self.position..end]);
        self.position = end;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        Ok(n)
    }
}

/// `<ArrayOfint>` document for `items`
pub fn int_sequence_document(items: &[i32]) -> String {
    let body: String = items.iter().map(|i| format!("<int>{}</int>", i)).collect();
    format!("<ArrayOfint>{}</ArrayOfint>", body)
}

/// `<ArrayOfArrayOfint>` document for `groups`
pub fn nested_int_sequence_document(groups: &[Vec<i32>]) -> String {
    let body: String = groups
        .iter()
        .map(|group| int_sequence_document(group))
        .collect();
    format!("<ArrayOfArrayOfint>{}</ArrayOfArrayOfint>", body)
}

/// `depth` nested elements named `n`
pub fn nested_elements(depth: usize) -> String {
    let mut doc = String::with_capacity(depth * 7);
    for _ in 0..depth {
        doc.push_str("<n>");
    }
    for _ in 0..depth {
        doc.push_str("</n>");
    }
    doc
}

/// UTF-16LE bytes with a byte-order mark
pub fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// Write `value` as a document of declared type `ty`
///
/// Covers scalars, optional values, lists, sequences, records and error
/// collections. Returns `None` for a value that does not fit `ty`.
pub fn write_document(ty: &TypeDesc, value: &Value) -> Option<String> {
    let mut out = String::new();
    write_element(&mut out, &ty.element_name(), ty, value, true, None)?;
    Some(out)
}

/// Like [`write_document`], with each child element on its own line,
/// indented two spaces per level
pub fn write_document_indented(ty: &TypeDesc, value: &Value) -> Option<String> {
    let mut out = String::new();
    write_element(&mut out, &ty.element_name(), ty, value, true, Some(0))?;
    out.push('\n');
    Some(out)
}

fn write_element(
    out: &mut String,
    name: &str,
    ty: &TypeDesc,
    value: &Value,
    root: bool,
    indent: Option<usize>,
) -> Option<()> {
    let ns = if root {
        format!(" xmlns:i=\"{}\"", XSI_NAMESPACE)
    } else {
        String::new()
    };

    if value.is_null() {
        out.push_str(&format!("<{}{} i:nil=\"true\"/>", name, ns));
        return Some(());
    }

    let ty = match ty {
        TypeDesc::Optional(inner) => inner.as_ref(),
        other => other,
    };

    let child_indent = indent.map(|level| level + 1);
    let newline = |out: &mut String, level: Option<usize>| {
        if let Some(level) = level {
            out.push('\n');
            out.push_str(&"  ".repeat(level));
        }
    };

    out.push_str(&format!("<{}{}>", name, ns));
    let mut has_children = false;
    match (ty, value) {
        (TypeDesc::Bool, Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
        (TypeDesc::Int, Value::Int(i)) => out.push_str(&i.to_string()),
        (TypeDesc::Long, Value::Long(l)) => out.push_str(&l.to_string()),
        (TypeDesc::Double, Value::Double(d)) => out.push_str(&d.to_string()),
        (TypeDesc::String, Value::String(s)) => out.push_str(&escape(s)),
        (TypeDesc::List(item), Value::List(items)) => {
            for element in items {
                newline(out, child_indent);
                write_element(out, &item.element_name(), item, element, false, child_indent)?;
                has_children = true;
            }
        }
        (TypeDesc::Interface(_), Value::List(items)) => {
            let item = ty.sequence_element()?;
            for element in items {
                newline(out, child_indent);
                write_element(out, &item.element_name(), item, element, false, child_indent)?;
                has_children = true;
            }
        }
        (TypeDesc::Record(desc), Value::Record(record)) => {
            for field in &desc.fields {
                if let Some(field_value) = record.get(&field.name) {
                    newline(out, child_indent);
                    write_element(out, &field.name, &field.ty, field_value, false, child_indent)?;
                    has_children = true;
                }
            }
        }
        (TypeDesc::ErrorCollection, Value::Errors(errors)) => {
            for (key, messages) in errors {
                for message in messages {
                    newline(out, child_indent);
                    out.push_str(&format!("<{}>{}</{}>", key, escape(message), key));
                    has_children = true;
                }
            }
        }
        _ => return None,
    }
    if has_children {
        newline(out, indent);
    }
    out.push_str(&format!("</{}>", name));
    Some(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
