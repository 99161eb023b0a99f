//! Type-directed deserialization over the element tree
//!
//! [`DocumentSerializer`] only constructs concrete types: scalars, optional
//! values, lists, records and surrogates. Bare interfaces and error
//! collections must be replaced by a surrogate before they get here.

use crate::reader::DocumentReader;
use crate::tree::Element;
use std::io::Read;
use xwrap_format::{
    surrogate_value, ReadError, Result, SurrogateItem, SurrogateShape, TypeDesc, Value,
};

/// Deserializer bound to one target type
#[derive(Debug, Clone)]
pub struct DocumentSerializer {
    target: TypeDesc,
}

impl DocumentSerializer {
    /// Create a serializer for `target`
    ///
    /// Fails with a configuration error when `target` (or anything nested in
    /// it) is not constructible.
    pub fn new(target: TypeDesc) -> Result<Self> {
        if let Some(offending) = first_unsupported(&target) {
            return Err(ReadError::Configuration(format!(
                "type '{}' cannot be deserialized directly: '{}' is not a constructible type",
                target, offending
            )));
        }
        Ok(Self { target })
    }

    /// Whether `ty` can be deserialized without a surrogate
    pub fn supports(ty: &TypeDesc) -> bool {
        first_unsupported(ty).is_none()
    }

    /// Type this serializer produces
    pub fn target(&self) -> &TypeDesc {
        &self.target
    }

    /// Read one document from `reader`
    pub fn read_object<R: Read>(&self, reader: &mut DocumentReader<R>) -> Result<Value> {
        let root = reader.read_root()?;
        self.read_element(&root)
    }

    /// Deserialize an already-parsed root element
    pub fn read_element(&self, root: &Element) -> Result<Value> {
        let expected = self.target.element_name();
        if root.name != expected {
            return Err(ReadError::malformed(
                format!(
                    "expected root element '{}', found '{}'",
                    expected, root.name
                ),
                root.position,
            ));
        }
        read_value(root, &self.target)
    }
}

fn first_unsupported(ty: &TypeDesc) -> Option<&TypeDesc> {
    match ty {
        TypeDesc::Bool | TypeDesc::Int | TypeDesc::Long | TypeDesc::Double | TypeDesc::String => {
            None
        }
        TypeDesc::Optional(inner) | TypeDesc::List(inner) => first_unsupported(inner),
        TypeDesc::Record(desc) => desc
            .fields
            .iter()
            .find_map(|field| first_unsupported(&field.ty)),
        TypeDesc::Surrogate(desc) => match desc.shape() {
            SurrogateShape::Collection { item } => first_unsupported(item),
            SurrogateShape::Dictionary { value } => first_unsupported(value),
        },
        TypeDesc::ErrorCollection | TypeDesc::Interface(_) => Some(ty),
    }
}

fn read_value(element: &Element, ty: &TypeDesc) -> Result<Value> {
    if element.is_nil() {
        if ty.is_value_type() {
            return Err(ReadError::malformed(
                format!("'{}' cannot be nil", element.name),
                element.position,
            ));
        }
        return Ok(Value::Null);
    }

    match ty {
        TypeDesc::Bool => match element.text.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            other => Err(invalid_scalar(element, "boolean", other)),
        },
        TypeDesc::Int => parse_scalar(element, "int").map(Value::Int),
        TypeDesc::Long => parse_scalar(element, "long").map(Value::Long),
        TypeDesc::Double => parse_double(element).map(Value::Double),
        TypeDesc::String => Ok(Value::String(element.text.clone())),
        TypeDesc::Optional(inner) => read_value(element, inner),
        TypeDesc::List(item) => {
            let item_name = item.element_name();
            element
                .children
                .iter()
                .map(|child| {
                    expect_name(child, &item_name)?;
                    read_value(child, item)
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::List)
        }
        TypeDesc::Record(desc) => {
            let mut record = desc.default_record();
            for child in &element.children {
                if let Some(field) = desc.find_field(&child.name) {
                    let value = read_value(child, &field.ty)?;
                    record.set(&field.name, value);
                }
            }
            Ok(Value::Record(record))
        }
        TypeDesc::Surrogate(desc) => {
            let mut instance = desc.construct()?;
            match desc.shape() {
                SurrogateShape::Collection { item } => {
                    let item_name = item.element_name();
                    for child in &element.children {
                        expect_name(child, &item_name)?;
                        instance.add(SurrogateItem::Element(read_value(child, item)?))?;
                    }
                }
                SurrogateShape::Dictionary { value } => {
                    for child in &element.children {
                        instance.add(SurrogateItem::Entry {
                            key: child.name.clone(),
                            value: read_value(child, value)?,
                        })?;
                    }
                }
            }
            Ok(surrogate_value(instance))
        }
        TypeDesc::ErrorCollection | TypeDesc::Interface(_) => Err(ReadError::Configuration(
            format!("type '{}' cannot be deserialized directly", ty),
        )),
    }
}

fn expect_name(child: &Element, expected: &str) -> Result<()> {
    if child.name != expected {
        return Err(ReadError::malformed(
            format!("expected element '{}', found '{}'", expected, child.name),
            child.position,
        ));
    }
    Ok(())
}

fn parse_scalar<T: std::str::FromStr>(element: &Element, kind: &str) -> Result<T> {
    let text = element.text.trim();
    text.parse::<T>()
        .map_err(|_| invalid_scalar(element, kind, text))
}

fn parse_double(element: &Element) -> Result<f64> {
    match element.text.trim() {
        "INF" => Ok(f64::INFINITY),
        "-INF" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => parse_scalar(element, "double"),
    }
}

fn invalid_scalar(element: &Element, kind: &str, text: &str) -> ReadError {
    ReadError::malformed(
        format!("invalid {} value '{}' in '{}'", kind, text, element.name),
        element.position,
    )
}
