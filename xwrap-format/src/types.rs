//! Runtime type descriptors
//!
//! A [`TypeDesc`] describes the type a caller asks the pipeline to produce.
//! Some descriptors are directly constructible by the document serializer
//! (scalars, lists, records); others are bare interfaces or ad-hoc shapes
//! that need a surrogate chosen by a wrapper provider.

use crate::constants::{ARRAY_OF_PREFIX, ERROR_ELEMENT};
use crate::error::{ReadError, Result};
use crate::surrogate::SurrogateDesc;
use crate::value::{Record, Value};
use std::fmt;
use std::sync::Arc;

/// Runtime type descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    /// `true`/`false`
    Bool,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 64-bit float
    Double,
    /// Text
    String,
    /// Nullable value
    Optional(Box<TypeDesc>),
    /// Concrete, constructible list
    List(Box<TypeDesc>),
    /// Named type with ordered fields
    Record(Arc<RecordDesc>),
    /// Key to messages collection; not serializable without a surrogate
    ErrorCollection,
    /// Bare interface
    Interface(InterfaceDesc),
    /// Surrogate type composed by a wrapper provider
    Surrogate(Arc<SurrogateDesc>),
}

/// Named record type
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDesc {
    /// Type (and element) name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDesc>,
    /// Value-shaped records default to a record of field defaults instead of null
    pub value_type: bool,
}

/// Record field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    /// Field (and element) name
    pub name: String,
    /// Field type
    pub ty: TypeDesc,
}

/// Bare interface descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDesc {
    /// Interface name
    pub name: String,
    /// Interface family
    pub kind: InterfaceKind,
    /// Generic arguments
    pub type_args: Vec<TypeDesc>,
}

/// Interface families the wrappers know about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    /// Single-element-type sequence (`Sequence<T>`)
    Sequence,
    /// Queryable sequence; also a single-element-type sequence
    Queryable,
    /// Key/value map
    Map,
    /// Polymorphic interface with no sequence contract
    Opaque,
}

impl RecordDesc {
    /// Create a reference-shaped record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            value_type: false,
        }
    }

    /// Append a field
    pub fn field(mut self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            ty,
        });
        self
    }

    /// Mark as value-shaped
    pub fn value_type(mut self) -> Self {
        self.value_type = true;
        self
    }

    /// Look up a field by name
    pub fn find_field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Record with every field at its default
    pub fn default_record(&self) -> Record {
        Record {
            type_name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.ty.default_value()))
                .collect(),
        }
    }
}

impl TypeDesc {
    /// `Sequence<T>`
    pub fn sequence(element: TypeDesc) -> Self {
        TypeDesc::Interface(InterfaceDesc {
            name: "Sequence".to_string(),
            kind: InterfaceKind::Sequence,
            type_args: vec![element],
        })
    }

    /// `Queryable<T>`
    pub fn queryable(element: TypeDesc) -> Self {
        TypeDesc::Interface(InterfaceDesc {
            name: "Queryable".to_string(),
            kind: InterfaceKind::Queryable,
            type_args: vec![element],
        })
    }

    /// `Map<K, V>`
    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::Interface(InterfaceDesc {
            name: "Map".to_string(),
            kind: InterfaceKind::Map,
            type_args: vec![key, value],
        })
    }

    /// Opaque polymorphic interface
    pub fn interface(name: impl Into<String>) -> Self {
        TypeDesc::Interface(InterfaceDesc {
            name: name.into(),
            kind: InterfaceKind::Opaque,
            type_args: Vec::new(),
        })
    }

    /// `List<T>`
    pub fn list(element: TypeDesc) -> Self {
        TypeDesc::List(Box::new(element))
    }

    /// `Optional<T>`
    pub fn optional(inner: TypeDesc) -> Self {
        TypeDesc::Optional(Box::new(inner))
    }

    /// Record type
    pub fn record(desc: RecordDesc) -> Self {
        TypeDesc::Record(Arc::new(desc))
    }

    /// Whether this is a bare interface
    pub fn is_interface(&self) -> bool {
        matches!(self, TypeDesc::Interface(_))
    }

    /// Value-shaped types default to a zero value; everything else defaults to null
    pub fn is_value_type(&self) -> bool {
        match self {
            TypeDesc::Bool | TypeDesc::Int | TypeDesc::Long | TypeDesc::Double => true,
            TypeDesc::Record(desc) => desc.value_type,
            _ => false,
        }
    }

    /// Default value used when the request body is empty
    pub fn default_value(&self) -> Value {
        match self {
            TypeDesc::Bool => Value::Bool(false),
            TypeDesc::Int => Value::Int(0),
            TypeDesc::Long => Value::Long(0),
            TypeDesc::Double => Value::Double(0.0),
            TypeDesc::Record(desc) if desc.value_type => Value::Record(desc.default_record()),
            _ => Value::Null,
        }
    }

    /// Element type of a single-element-type sequence interface
    pub fn sequence_element(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::Interface(iface)
                if matches!(iface.kind, InterfaceKind::Sequence | InterfaceKind::Queryable)
                    && iface.type_args.len() == 1 =>
            {
                iface.type_args.first()
            }
            _ => None,
        }
    }

    /// Document element name for this type
    pub fn element_name(&self) -> String {
        match self {
            TypeDesc::Bool => "boolean".to_string(),
            TypeDesc::Int => "int".to_string(),
            TypeDesc::Long => "long".to_string(),
            TypeDesc::Double => "double".to_string(),
            TypeDesc::String => "string".to_string(),
            TypeDesc::Optional(inner) => inner.element_name(),
            TypeDesc::List(element) => format!("{}{}", ARRAY_OF_PREFIX, element.element_name()),
            TypeDesc::Record(desc) => desc.name.clone(),
            TypeDesc::ErrorCollection => ERROR_ELEMENT.to_string(),
            TypeDesc::Interface(iface) => match iface.kind {
                InterfaceKind::Map | InterfaceKind::Opaque => iface.name.clone(),
                InterfaceKind::Sequence | InterfaceKind::Queryable => {
                    let args: String = iface.type_args.iter().map(|t| t.element_name()).collect();
                    format!("{}{}", ARRAY_OF_PREFIX, args)
                }
            },
            TypeDesc::Surrogate(desc) => desc.element_name().to_string(),
        }
    }

    /// Parse a type expression such as `Sequence<Optional<int>>`
    ///
    /// Unknown bare names parse as opaque interfaces.
    pub fn parse(input: &str) -> Result<Self> {
        let mut parser = TypeParser {
            input,
            chars: input.char_indices().peekable(),
            depth: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if let Some(&(idx, _)) = parser.chars.peek() {
            return Err(parser.error(idx, "trailing input"));
        }
        Ok(ty)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Bool => f.write_str("bool"),
            TypeDesc::Int => f.write_str("int"),
            TypeDesc::Long => f.write_str("long"),
            TypeDesc::Double => f.write_str("double"),
            TypeDesc::String => f.write_str("string"),
            TypeDesc::Optional(inner) => write!(f, "Optional<{}>", inner),
            TypeDesc::List(element) => write!(f, "List<{}>", element),
            TypeDesc::Record(desc) => f.write_str(&desc.name),
            TypeDesc::ErrorCollection => f.write_str(ERROR_ELEMENT),
            TypeDesc::Interface(iface) => {
                f.write_str(&iface.name)?;
                if !iface.type_args.is_empty() {
                    f.write_str("<")?;
                    for (idx, arg) in iface.type_args.iter().enumerate() {
                        if idx > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeDesc::Surrogate(desc) => f.write_str(desc.name()),
        }
    }
}

/// Deepest `<...>` nesting a type expression may use
const MAX_TYPE_NESTING: usize = 64;

struct TypeParser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn parse_type(&mut self) -> Result<TypeDesc> {
        self.skip_ws();
        let start = self.chars.peek().map(|(idx, _)| *idx).unwrap_or(self.input.len());
        let name = self.ident();
        if name.is_empty() {
            return Err(self.error(start, "expected a type name"));
        }

        self.skip_ws();
        let mut args = Vec::new();
        if let Some(&(open, '<')) = self.chars.peek() {
            self.chars.next();
            if self.depth >= MAX_TYPE_NESTING {
                return Err(self.error(open, "type nesting too deep"));
            }
            self.depth += 1;
            loop {
                args.push(self.parse_type()?);
                self.skip_ws();
                match self.chars.next() {
                    Some((_, ',')) => continue,
                    Some((_, '>')) => break,
                    Some((idx, _)) => return Err(self.error(idx, "expected ',' or '>'")),
                    None => return Err(self.error(self.input.len(), "unclosed '<'")),
                }
            }
            self.depth -= 1;
        }

        let arity = |expected: usize, args: Vec<TypeDesc>| -> Result<Vec<TypeDesc>> {
            if args.len() != expected {
                return Err(ReadError::Configuration(format!(
                    "type '{}' takes {} type argument(s), got {}",
                    name,
                    expected,
                    args.len()
                )));
            }
            Ok(args)
        };

        let ty = match name {
            "bool" | "boolean" => {
                arity(0, args)?;
                TypeDesc::Bool
            }
            "int" => {
                arity(0, args)?;
                TypeDesc::Int
            }
            "long" => {
                arity(0, args)?;
                TypeDesc::Long
            }
            "double" => {
                arity(0, args)?;
                TypeDesc::Double
            }
            "string" => {
                arity(0, args)?;
                TypeDesc::String
            }
            "Error" => {
                arity(0, args)?;
                TypeDesc::ErrorCollection
            }
            "List" => TypeDesc::list(arity(1, args)?.remove(0)),
            "Optional" => TypeDesc::optional(arity(1, args)?.remove(0)),
            "Sequence" => TypeDesc::sequence(arity(1, args)?.remove(0)),
            "Queryable" => TypeDesc::queryable(arity(1, args)?.remove(0)),
            "Map" => {
                let mut args = arity(2, args)?;
                let key = args.remove(0);
                let value = args.remove(0);
                TypeDesc::map(key, value)
            }
            other => TypeDesc::Interface(InterfaceDesc {
                name: other.to_string(),
                kind: InterfaceKind::Opaque,
                type_args: args,
            }),
        };
        Ok(ty)
    }

    fn ident(&mut self) -> &'a str {
        let start = match self.chars.peek() {
            Some((idx, _)) => *idx,
            None => return "",
        };
        let mut end = start;
        while let Some((idx, ch)) = self.chars.peek() {
            if ch.is_alphanumeric() || *ch == '_' {
                end = idx + ch.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        &self.input[start..end]
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some((_, ch)) if ch.is_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&self, position: usize, reason: &str) -> ReadError {
        ReadError::Configuration(format!(
            "invalid type expression '{}' at {}: {}",
            self.input, position, reason
        ))
    }
}
