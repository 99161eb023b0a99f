//! Property tests for the document reader and serializer
//!
//! Arbitrary input must never panic, quotas must hold for any nesting, and
//! text must survive escaping in every supported encoding.

use proptest::prelude::*;
use quick_xml::escape::escape;
use std::io::Cursor;
use xwrap_codec::{DocumentReader, DocumentSerializer};
use xwrap_format::{QuotaKind, ReadError, ReaderQuotas, TextEncoding, TypeDesc, Value};

fn open(bytes: Vec<u8>, quotas: ReaderQuotas) -> DocumentReader<Cursor<Vec<u8>>> {
    DocumentReader::new(Cursor::new(bytes), None, &TextEncoding::defaults(), quotas)
        .expect("valid quotas")
}

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

fn nested(depth: usize) -> String {
    let mut doc = String::new();
    for _ in 0..depth {
        doc.push_str("<n>");
    }
    for _ in 0..depth {
        doc.push_str("</n>");
    }
    doc
}

proptest! {
    #[test]
    fn arbitrary_bytes_never_panic(input in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut reader = open(input, ReaderQuotas::default());
        let _ = reader.read_root();
    }

    #[test]
    fn string_content_survives_escaping(text in "[a-zA-Z0-9 <>&'\"\u{e9}\u{1F600}]{0,64}") {
        let doc = format!("<string>{}</string>", escape(text.as_str()));
        let serializer = DocumentSerializer::new(TypeDesc::String).unwrap();

        let mut utf8 = open(doc.clone().into_bytes(), ReaderQuotas::default());
        let from_utf8 = serializer.read_object(&mut utf8).unwrap();
        prop_assert_eq!(&from_utf8, &Value::String(text.clone()));

        let mut utf16 = open(utf16le_with_bom(&doc), ReaderQuotas::default());
        prop_assert_eq!(utf16.encoding(), TextEncoding::Utf16Le);
        let from_utf16 = serializer.read_object(&mut utf16).unwrap();
        prop_assert_eq!(from_utf16, from_utf8);
    }

    #[test]
    fn depth_quota_holds_for_any_nesting(depth in 1usize..48, limit in 1usize..40) {
        let quotas = ReaderQuotas { max_depth: limit, ..ReaderQuotas::default() };
        let result = open(nested(depth).into_bytes(), quotas).read_root();
        if depth <= limit {
            prop_assert!(result.is_ok());
        } else {
            let is_depth_error = matches!(
                result,
                Err(ReadError::QuotaExceeded { quota: QuotaKind::MaxDepth, .. })
            );
            prop_assert!(is_depth_error);
        }
    }

    #[test]
    fn int_lists_read_in_order(items in prop::collection::vec(any::<i32>(), 0..64)) {
        let body: String = items.iter().map(|i| format!("<int>{}</int>", i)).collect();
        let doc = format!("<ArrayOfint>{}</ArrayOfint>", body);
        let serializer = DocumentSerializer::new(TypeDesc::list(TypeDesc::Int)).unwrap();
        let value = serializer
            .read_object(&mut open(doc.into_bytes(), ReaderQuotas::default()))
            .unwrap();
        prop_assert_eq!(value, Value::from(items));
    }

    #[test]
    fn indented_lists_fit_tight_quotas(
        items in prop::collection::vec(any::<i32>(), 1..64),
        indent in 0usize..10,
    ) {
        let pad = format!("\r\n{}", " ".repeat(indent));
        let body: String = items
            .iter()
            .map(|i| format!("{}<int>{}</int>", pad, i))
            .collect();
        let doc = format!("<ArrayOfint>{}\n</ArrayOfint>", body);
        let quotas = ReaderQuotas {
            max_string_content_length: 12,
            max_array_length: items.len(),
            ..ReaderQuotas::default()
        };
        let serializer = DocumentSerializer::new(TypeDesc::list(TypeDesc::Int)).unwrap();
        let value = serializer
            .read_object(&mut open(doc.into_bytes(), quotas))
            .unwrap();
        prop_assert_eq!(value, Value::from(items));
    }
}

#[test]
fn declared_charset_overrides_detection() {
    let doc = "<string>caf\u{e9}</string>";
    let mut bytes = Vec::new();
    for unit in doc.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let mut reader = DocumentReader::new(
        Cursor::new(bytes),
        Some(TextEncoding::Utf16Le),
        &TextEncoding::defaults(),
        ReaderQuotas::default(),
    )
    .unwrap();
    let value = DocumentSerializer::new(TypeDesc::String)
        .unwrap()
        .read_object(&mut reader)
        .unwrap();
    assert_eq!(value, Value::from("caf\u{e9}"));
}
