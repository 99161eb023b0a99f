//! Constants shared by the reader, the serializer and the formatter

/// Media types accepted by default, in order
pub const DEFAULT_SUPPORTED_MEDIA_TYPES: [&str; 2] = ["application/xml", "text/xml"];

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Local name of the attribute marking a null element (`i:nil="true"`)
pub const NIL_ATTRIBUTE: &str = "nil";

/// Element name prefix for collection contracts (`ArrayOfint`)
pub const ARRAY_OF_PREFIX: &str = "ArrayOf";

/// Root element name of an error collection document
pub const ERROR_ELEMENT: &str = "Error";

/// UTF-8 byte-order mark
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// UTF-16 little-endian byte-order mark
pub const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
