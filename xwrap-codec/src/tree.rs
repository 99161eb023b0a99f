//! In-memory element tree produced by the document reader

use xwrap_format::constants::{NIL_ATTRIBUTE, XSI_NAMESPACE};

/// An attribute with its resolved namespace
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attribute {
    /// Namespace URI the prefix is bound to; `None` for unprefixed names
    pub namespace: Option<String>,
    /// Local name
    pub name: String,
    /// Unescaped value
    pub value: String,
}

impl Attribute {
    /// Attribute in no namespace
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute in `namespace`
    pub fn qualified(
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A parsed element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Local name
    pub name: String,
    /// Attributes, namespace declarations excluded
    pub attributes: Vec<Attribute>,
    /// Concatenated character content (text, CDATA, resolved references)
    pub text: String,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Byte offset of the start tag in the decoded document
    pub position: u64,
}

impl Element {
    /// Create an empty element
    pub fn new(name: impl Into<String>, position: u64) -> Self {
        Self {
            name: name.into(),
            position,
            ..Self::default()
        }
    }

    /// Value of the unprefixed attribute `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attribute_ns(None, name)
    }

    /// Value of attribute `name` in `namespace`
    pub fn attribute_ns(&self, namespace: Option<&str>, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name && attr.namespace.as_deref() == namespace)
            .map(|attr| attr.value.as_str())
    }

    /// `xsi:nil="true"` marks an explicit null; `nil` in any other namespace does not
    pub fn is_nil(&self) -> bool {
        matches!(
            self.attribute_ns(Some(XSI_NAMESPACE), NIL_ATTRIBUTE),
            Some(v) if v.trim() == "true" || v.trim() == "1"
        )
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Number of elements in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Element::count).sum::<usize>()
    }
}
