//! Surrogate types and instances
//!
//! A surrogate is a concrete, serializer-friendly type that stands in for a
//! declared type the document serializer cannot construct. Each composed
//! surrogate type is described by a [`SurrogateDesc`], which maps the runtime
//! descriptor to a constructor closure; instances implement [`Surrogate`].

use crate::error::{ReadError, Result};
use crate::types::TypeDesc;
use crate::value::{SurrogateValue, Value};
use std::fmt;
use std::sync::Arc;

/// Constructor producing an empty surrogate instance for the serializer to populate
pub type SurrogateCtor = Arc<dyn Fn() -> Result<Box<dyn Surrogate>> + Send + Sync>;

/// How the document serializer reads a surrogate's children
#[derive(Debug, Clone, PartialEq)]
pub enum SurrogateShape {
    /// Each child element is one item of the given type
    Collection {
        /// Item type as it appears in the document
        item: TypeDesc,
    },
    /// Each child element is a key (its name) and a value of the given type
    Dictionary {
        /// Entry value type
        value: TypeDesc,
    },
}

/// Descriptor of a composed surrogate type
#[derive(Clone)]
pub struct SurrogateDesc {
    name: String,
    element_name: String,
    shape: SurrogateShape,
    ctor: SurrogateCtor,
}

impl SurrogateDesc {
    /// Describe a surrogate type
    pub fn new(
        name: impl Into<String>,
        element_name: impl Into<String>,
        shape: SurrogateShape,
        ctor: SurrogateCtor,
    ) -> Self {
        Self {
            name: name.into(),
            element_name: element_name.into(),
            shape,
            ctor,
        }
    }

    /// Display name, e.g. `DelegatingSequence<int, int>`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root element name in documents
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Child layout
    pub fn shape(&self) -> &SurrogateShape {
        &self.shape
    }

    /// Build an empty instance
    pub fn construct(&self) -> Result<Box<dyn Surrogate>> {
        (self.ctor)().map_err(|err| match err {
            ReadError::Configuration(_) => err,
            other => ReadError::Configuration(format!(
                "surrogate type '{}' could not be constructed: {}",
                self.name, other
            )),
        })
    }
}

impl PartialEq for SurrogateDesc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.element_name == other.element_name
            && self.shape == other.shape
    }
}

impl fmt::Debug for SurrogateDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurrogateDesc")
            .field("name", &self.name)
            .field("element_name", &self.element_name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// One child of a surrogate, as exchanged with the document serializer
#[derive(Debug, Clone, PartialEq)]
pub enum SurrogateItem {
    /// Collection element, in wrapped shape
    Element(Value),
    /// Dictionary entry
    Entry {
        /// Entry key
        key: String,
        /// Entry value
        value: Value,
    },
}

/// Surrogate instance behaviour
pub trait Surrogate: fmt::Debug + Send + Sync {
    /// The surrogate type of this instance
    fn type_desc(&self) -> TypeDesc;

    /// Number of items currently held
    fn len(&self) -> usize;

    /// Whether no items are held
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate items in wrapped shape; conversion happens per item as the
    /// iterator advances
    fn wrapped_items(&self) -> Box<dyn Iterator<Item = Result<SurrogateItem>> + '_>;

    /// Accept one wrapped-shape item during population; the item is stored
    /// converted back to the declared shape
    fn add(&mut self, item: SurrogateItem) -> Result<()>;

    /// Contents in declared shape, without consuming the instance
    fn declared_value(&self) -> Value;

    /// Convert back to the declared type
    fn unwrap(self: Box<Self>, declared: &TypeDesc) -> Result<Value>;

    /// Clone behind the trait object
    fn clone_box(&self) -> Box<dyn Surrogate>;
}

/// Unwrap a value that may be a surrogate instance
///
/// `Null` stays `Null`; a surrogate is converted back to `declared`; any other
/// value is already in declared shape and is returned as is.
pub fn unwrap_value(value: Value, declared: &TypeDesc) -> Result<Value> {
    match value {
        Value::Surrogate(surrogate) => surrogate.into_inner().unwrap(declared),
        other => Ok(other),
    }
}

/// Put a surrogate instance into a [`Value`]
pub fn surrogate_value(instance: Box<dyn Surrogate>) -> Value {
    Value::Surrogate(SurrogateValue::new(instance))
}
