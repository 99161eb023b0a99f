//! Quota-bounded document reader
//!
//! Builds an [`Element`] tree from a request body while enforcing every
//! [`ReaderQuotas`] limit. The reader owns the body stream; dropping the
//! reader releases it.

use crate::decode::DecodedStream;
use crate::tree::{Attribute, Element};
use quick_xml::events::{BytesStart, Event};
use quick_xml::escape::resolve_xml_entity;
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;
use std::collections::HashSet;
use std::io::{self, BufReader, Read};
use xwrap_format::{QuotaKind, ReadError, ReaderQuotas, Result, TextEncoding};

/// Counters gathered while reading a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Bytes consumed from the body stream
    pub bytes_read: u64,
    /// Elements parsed
    pub elements: usize,
    /// Deepest nesting seen (root is depth 1)
    pub max_depth: usize,
}

/// Element under construction, with the character count of its text so far
struct OpenElement {
    element: Element,
    text_chars: usize,
}

/// Reader over a single document
pub struct DocumentReader<R: Read> {
    xml: NsReader<BufReader<DecodedStream<R>>>,
    quotas: ReaderQuotas,
    names: HashSet<String>,
    name_chars: usize,
    stats: ReaderStats,
    consumed: bool,
}

impl<R: Read> DocumentReader<R> {
    /// Open a reader over `stream`
    ///
    /// `declared` is the encoding named by the request, if any; see
    /// [`DecodedStream::new`] for detection rules.
    pub fn new(
        stream: R,
        declared: Option<TextEncoding>,
        supported: &[TextEncoding],
        quotas: ReaderQuotas,
    ) -> Result<Self> {
        quotas.validate()?;
        let decoded = DecodedStream::new(stream, declared, supported)?;
        tracing::trace!(encoding = %decoded.encoding(), "document reader opened");

        let mut xml = NsReader::from_reader(BufReader::new(decoded));
        xml.config_mut().trim_text(false);
        xml.config_mut().check_end_names = true;

        Ok(Self {
            xml,
            quotas,
            names: HashSet::new(),
            name_chars: 0,
            stats: ReaderStats::default(),
            consumed: false,
        })
    }

    /// Encoding the body is decoded with
    pub fn encoding(&self) -> TextEncoding {
        self.xml.get_ref().get_ref().encoding()
    }

    /// Quotas in force
    pub fn quotas(&self) -> &ReaderQuotas {
        &self.quotas
    }

    /// Counters so far
    pub fn stats(&self) -> ReaderStats {
        ReaderStats {
            bytes_read: self.xml.get_ref().get_ref().raw_bytes(),
            ..self.stats
        }
    }

    /// Read the root element and everything below it
    ///
    /// A reader yields one document; a second call is a configuration error.
    pub fn read_root(&mut self) -> Result<Element> {
        if self.consumed {
            return Err(ReadError::Configuration(
                "document reader already consumed".to_string(),
            ));
        }
        self.consumed = true;

        let mut stack: Vec<OpenElement> = Vec::new();
        let mut buf = Vec::new();

        loop {
            let offset = self.xml.buffer_position();
            let event = match self.xml.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(err) => return Err(self.xml_error(err)),
            };

            match event {
                Event::Start(ref start) => {
                    let element = self.open_element(start, offset, stack.len())?;
                    stack.push(OpenElement {
                        element,
                        text_chars: 0,
                    });
                }
                Event::Empty(ref start) => {
                    let element = self.open_element(start, offset, stack.len())?;
                    if let Some(root) = self.close_element(&mut stack, element)? {
                        return Ok(root);
                    }
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .map(|open| open.element)
                        .ok_or_else(|| ReadError::malformed("unexpected end tag", offset))?;
                    if let Some(root) = self.close_element(&mut stack, element)? {
                        return Ok(root);
                    }
                }
                Event::Text(ref text) => {
                    let content = text
                        .decode()
                        .map_err(|e| ReadError::malformed(e.to_string(), offset))?;
                    self.append_text(&mut stack, &content, offset)?;
                }
                Event::CData(ref cdata) => {
                    let content = std::str::from_utf8(cdata)
                        .map_err(|e| ReadError::malformed(e.to_string(), offset))?
                        .to_string();
                    self.append_text(&mut stack, &content, offset)?;
                }
                Event::GeneralRef(ref reference) => {
                    let raw = reference
                        .decode()
                        .map_err(|e| ReadError::malformed(e.to_string(), offset))?;
                    let content = resolve_entity(&raw, offset)?;
                    self.append_text(&mut stack, &content, offset)?;
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Eof => {
                    let message = if stack.is_empty() {
                        "document has no root element"
                    } else {
                        "unexpected end of document"
                    };
                    return Err(ReadError::malformed(message, offset));
                }
            }
            buf.clear();
        }
    }

    fn open_element(&mut self, start: &BytesStart<'_>, offset: u64, parents: usize) -> Result<Element> {
        let depth = parents + 1;
        self.quotas.check(QuotaKind::MaxDepth, depth)?;
        let tag_bytes = (self.xml.buffer_position() - offset) as usize;
        self.quotas.check(QuotaKind::MaxBytesPerRead, tag_bytes)?;

        let name = decode_name(start.local_name().as_ref(), offset)?;
        self.intern(&name)?;
        let mut element = Element::new(name, offset);

        for attr in start.attributes() {
            let attr = attr.map_err(|e| ReadError::malformed(e.to_string(), offset))?;
            if is_namespace_declaration(&attr.key) {
                continue;
            }
            let (resolved, _) = self.xml.resolver().resolve_attribute(attr.key);
            let namespace = resolve_namespace(resolved, offset)?;
            let key = decode_name(attr.key.local_name().as_ref(), offset)?;
            self.intern(&key)?;
            let value = attr
                .unescape_value()
                .map_err(|e| ReadError::malformed(e.to_string(), offset))?
                .into_owned();
            self.quotas
                .check(QuotaKind::MaxStringContentLength, value.chars().count())?;
            element.attributes.push(Attribute {
                namespace,
                name: key,
                value,
            });
        }

        self.stats.elements += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        Ok(element)
    }

    /// Attach a finished element to its parent; returns the root once it closes
    fn close_element(
        &mut self,
        stack: &mut [OpenElement],
        element: Element,
    ) -> Result<Option<Element>> {
        match stack.last_mut() {
            Some(parent) => {
                // Whitespace ahead of the first child is indentation, not content
                if parent.element.children.is_empty() && is_whitespace(&parent.element.text) {
                    parent.element.text.clear();
                    parent.text_chars = 0;
                }
                parent.element.children.push(element);
                self.quotas
                    .check(QuotaKind::MaxArrayLength, parent.element.children.len())?;
                Ok(None)
            }
            None => {
                tracing::trace!(
                    root = %element.name,
                    elements = self.stats.elements,
                    "document read"
                );
                Ok(Some(element))
            }
        }
    }

    fn append_text(&mut self, stack: &mut [OpenElement], content: &str, offset: u64) -> Result<()> {
        match stack.last_mut() {
            Some(open) => {
                if !open.element.children.is_empty() && is_whitespace(content) {
                    return Ok(());
                }
                open.text_chars += content.chars().count();
                self.quotas
                    .check(QuotaKind::MaxStringContentLength, open.text_chars)?;
                open.element.text.push_str(content);
                Ok(())
            }
            None if is_whitespace(content) => Ok(()),
            None => Err(ReadError::malformed(
                "character data outside the root element",
                offset,
            )),
        }
    }

    fn intern(&mut self, name: &str) -> Result<()> {
        if self.names.contains(name) {
            return Ok(());
        }
        self.name_chars += name.chars().count();
        self.quotas
            .check(QuotaKind::MaxNameTableCharCount, self.name_chars)?;
        self.names.insert(name.to_string());
        Ok(())
    }

    fn xml_error(&self, err: quick_xml::Error) -> ReadError {
        let position = self.xml.error_position();
        match err {
            quick_xml::Error::Io(io_err) if io_err.kind() != io::ErrorKind::InvalidData => {
                ReadError::Io(io::Error::new(io_err.kind(), io_err.to_string()))
            }
            other => ReadError::malformed(other.to_string(), position),
        }
    }
}

impl<R: Read> Drop for DocumentReader<R> {
    fn drop(&mut self) {
        tracing::trace!(
            bytes_read = self.xml.get_ref().get_ref().raw_bytes(),
            "document reader released"
        );
    }
}

fn decode_name(raw: &[u8], offset: u64) -> Result<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| ReadError::malformed(e.to_string(), offset))
}

fn is_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

fn resolve_namespace(resolved: ResolveResult<'_>, offset: u64) -> Result<Option<String>> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ReadError::malformed(
            format!(
                "unbound namespace prefix '{}'",
                String::from_utf8_lossy(&prefix)
            ),
            offset,
        )),
    }
}

fn is_namespace_declaration(name: &QName<'_>) -> bool {
    match name.prefix() {
        Some(prefix) => prefix.as_ref() == b"xmlns",
        None => name.local_name().as_ref() == b"xmlns",
    }
}

/// Resolve a predefined entity or character reference
fn resolve_entity(raw: &str, offset: u64) -> Result<String> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.to_string());
    }

    if let Some(rest) = raw.strip_prefix('#') {
        let code = match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => rest.parse::<u32>().ok(),
        };
        if let Some(ch) = code.and_then(char::from_u32) {
            return Ok(ch.to_string());
        }
        return Err(ReadError::malformed(
            format!("invalid character reference '&{};'", raw),
            offset,
        ));
    }

    Err(ReadError::malformed(
        format!("undefined entity '&{};'", raw),
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(doc: &str, quotas: ReaderQuotas) -> Result<DocumentReader<Cursor<Vec<u8>>>> {
        DocumentReader::new(
            Cursor::new(doc.as_bytes().to_vec()),
            None,
            &TextEncoding::defaults(),
            quotas,
        )
    }

    fn read(doc: &str) -> Result<Element> {
        reader(doc, ReaderQuotas::default())?.read_root()
    }

    #[test]
    fn builds_tree_with_text_and_attributes() {
        let root = read(
            r#"<?xml version="1.0"?>
<ArrayOfint xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
  <int>1</int>
  <int i:nil="true"/>
</ArrayOfint>"#,
        )
        .unwrap();
        assert_eq!(root.name, "ArrayOfint");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "1");
        assert!(root.children[1].is_nil());
        assert!(root.attributes.is_empty());
        assert!(root.text.is_empty());
    }

    #[test]
    fn indentation_does_not_count_against_string_quota() {
        let quotas = ReaderQuotas {
            max_string_content_length: 8,
            ..ReaderQuotas::default()
        };
        let mut doc = String::from("<ArrayOfint>");
        for i in 0..40 {
            doc.push_str(&format!("\n  <int>{}</int>", i));
        }
        doc.push_str("\n</ArrayOfint>");

        let root = reader(&doc, quotas).unwrap().read_root().unwrap();
        assert_eq!(root.children.len(), 40);
        assert!(root.text.is_empty());
        assert_eq!(root.children[39].text, "39");
    }

    #[test]
    fn string_quota_counts_across_reference_chunks() {
        let doc = format!("<string>{}</string>", "&amp;".repeat(10));
        let at_limit = ReaderQuotas {
            max_string_content_length: 10,
            ..ReaderQuotas::default()
        };
        let root = reader(&doc, at_limit).unwrap().read_root().unwrap();
        assert_eq!(root.text, "&".repeat(10));

        let below = ReaderQuotas {
            max_string_content_length: 9,
            ..ReaderQuotas::default()
        };
        let err = reader(&doc, below).unwrap().read_root().unwrap_err();
        assert!(matches!(
            err,
            ReadError::QuotaExceeded {
                quota: QuotaKind::MaxStringContentLength,
                limit: 9
            }
        ));
    }

    #[test]
    fn attributes_carry_resolved_namespaces() {
        let root = read(
            r#"<a xmlns:i="http://www.w3.org/2001/XMLSchema-instance" xmlns:x="urn:other" i:type="t" x:nil="true" plain="p"/>"#,
        )
        .unwrap();
        assert_eq!(root.attributes.len(), 3);
        assert_eq!(
            root.attribute_ns(Some("http://www.w3.org/2001/XMLSchema-instance"), "type"),
            Some("t")
        );
        assert_eq!(root.attribute_ns(Some("urn:other"), "nil"), Some("true"));
        assert_eq!(root.attribute("plain"), Some("p"));
        assert!(!root.is_nil());
    }

    #[test]
    fn resolves_references() {
        let root = read("<string>a &amp; b &#x41;&#66;</string>").unwrap();
        assert_eq!(root.text, "a & b AB");
        let root = read("<string><![CDATA[<raw>]]></string>").unwrap();
        assert_eq!(root.text, "<raw>");
    }

    #[test]
    fn unknown_entity_is_malformed() {
        let err = read("<string>&bogus;</string>").unwrap_err();
        assert!(matches!(err, ReadError::MalformedDocument { .. }));
    }

    #[test]
    fn truncated_and_empty_documents_are_malformed() {
        assert!(matches!(
            read("<ArrayOfint><int>1</int>").unwrap_err(),
            ReadError::MalformedDocument { .. }
        ));
        assert!(matches!(
            read("   ").unwrap_err(),
            ReadError::MalformedDocument { .. }
        ));
        assert!(matches!(
            read("<a></b>").unwrap_err(),
            ReadError::MalformedDocument { .. }
        ));
    }

    #[test]
    fn depth_quota_is_enforced() {
        let quotas = ReaderQuotas {
            max_depth: 2,
            ..ReaderQuotas::default()
        };
        assert!(reader("<a><b/></a>", quotas.clone())
            .unwrap()
            .read_root()
            .is_ok());
        let err = reader("<a><b><c/></b></a>", quotas)
            .unwrap()
            .read_root()
            .unwrap_err();
        assert!(matches!(
            err,
            ReadError::QuotaExceeded {
                quota: QuotaKind::MaxDepth,
                limit: 2
            }
        ));
    }

    #[test]
    fn string_and_array_quotas_are_enforced() {
        let quotas = ReaderQuotas {
            max_string_content_length: 3,
            ..ReaderQuotas::default()
        };
        let err = reader("<string>abcd</string>", quotas)
            .unwrap()
            .read_root()
            .unwrap_err();
        assert!(err.is_quota_exceeded());

        let quotas = ReaderQuotas {
            max_array_length: 2,
            ..ReaderQuotas::default()
        };
        let err = reader("<a><int/><int/><int/></a>", quotas)
            .unwrap()
            .read_root()
            .unwrap_err();
        assert!(matches!(
            err,
            ReadError::QuotaExceeded {
                quota: QuotaKind::MaxArrayLength,
                ..
            }
        ));
    }

    #[test]
    fn name_table_counts_distinct_names_once() {
        let quotas = ReaderQuotas {
            max_name_table_char_count: 4,
            ..ReaderQuotas::default()
        };
        assert!(reader("<a><int/><int/></a>", quotas.clone())
            .unwrap()
            .read_root()
            .is_ok());
        let err = reader("<a><int/><long/></a>", quotas)
            .unwrap()
            .read_root()
            .unwrap_err();
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn bytes_per_read_limits_start_tags() {
        let quotas = ReaderQuotas {
            max_bytes_per_read: 8,
            ..ReaderQuotas::default()
        };
        let err = reader(r#"<a attribute="long value"/>"#, quotas)
            .unwrap()
            .read_root()
            .unwrap_err();
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn zero_quota_rejected_on_open() {
        let quotas = ReaderQuotas {
            max_depth: 0,
            ..ReaderQuotas::default()
        };
        assert!(reader("<a/>", quotas).err().map_or(false, |e| e.is_configuration()));
    }

    #[test]
    fn second_read_is_rejected() {
        let mut reader = reader("<a/>", ReaderQuotas::default()).unwrap();
        reader.read_root().unwrap();
        assert!(reader.read_root().unwrap_err().is_configuration());
    }

    #[test]
    fn stats_track_elements_and_depth() {
        let mut reader = reader("<a><b><c/></b><b/></a>", ReaderQuotas::default()).unwrap();
        reader.read_root().unwrap();
        let stats = reader.stats();
        assert_eq!(stats.elements, 4);
        assert_eq!(stats.max_depth, 3);
        assert!(stats.bytes_read >= 22);
    }
}
