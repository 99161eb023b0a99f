//! Sequence wrapper provider
//!
//! A bare `Sequence<E>` cannot be constructed by the serializer. The provider
//! composes `DelegatingSequence<E', E>`, a concrete list surrogate whose
//! document elements have type `E'` (the surrogate of `E`, or `E` itself)
//! while its backing storage holds declared `E` values.
//!
//! Conversion is lazy both ways: [`Surrogate::wrapped_items`] wraps one
//! element per step through the element provider, and [`Surrogate::add`]
//! unwraps each incoming element as it is populated.

use super::context::WrapperProviderContext;
use super::provider::{WrapperProvider, WrapperProviderFactory, WrapperProviderRegistry};
use std::sync::{Arc, Weak};
use xwrap_format::constants::ARRAY_OF_PREFIX;
use xwrap_format::{
    surrogate_value, unwrap_value, InterfaceKind, ReadError, Result, Surrogate, SurrogateDesc,
    SurrogateItem, SurrogateShape, TypeDesc, Value,
};

/// Claims `Sequence<T>` and `Queryable<T>` interfaces
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceWrapperProviderFactory;

impl WrapperProviderFactory for SequenceWrapperProviderFactory {
    fn name(&self) -> &str {
        "sequence"
    }

    fn provider(
        &self,
        context: &WrapperProviderContext,
        registry: &WrapperProviderRegistry,
    ) -> Result<Option<Arc<dyn WrapperProvider>>> {
        let declared = context.declared_type();
        let is_sequence = matches!(
            declared,
            TypeDesc::Interface(iface)
                if matches!(iface.kind, InterfaceKind::Sequence | InterfaceKind::Queryable)
        );
        if !is_sequence {
            return Ok(None);
        }

        let inner = match declared.sequence_element() {
            Some(element) => registry.resolve(&context.with_declared_type(element.clone()))?,
            None => None,
        };
        let provider = SequenceWrapperProvider::new(declared.clone(), inner)?;
        Ok(Some(Arc::new(provider)))
    }
}

/// Provider for one declared sequence type
#[derive(Debug, Clone)]
pub struct SequenceWrapperProvider {
    declared: TypeDesc,
    element: TypeDesc,
    inner: Option<Arc<dyn WrapperProvider>>,
    desc: Arc<SurrogateDesc>,
    wrapping: TypeDesc,
}

impl SequenceWrapperProvider {
    /// Compose the surrogate for `declared`
    ///
    /// `inner` is the already-resolved provider for the element type, if the
    /// element type needs one. Fails with `InvalidShape` unless `declared` is
    /// an interface with exactly one sequence element type.
    pub fn new(declared: TypeDesc, inner: Option<Arc<dyn WrapperProvider>>) -> Result<Self> {
        let element = declared
            .sequence_element()
            .cloned()
            .ok_or_else(|| ReadError::InvalidShape {
                type_name: declared.to_string(),
                reason: "expected an interface with exactly one sequence element type"
                    .to_string(),
            })?;

        let wrapped_element = match &inner {
            Some(provider) => provider.wrapping_type().clone(),
            None => element.clone(),
        };
        let name = format!("DelegatingSequence<{}, {}>", wrapped_element, element);
        let element_name = format!("{}{}", ARRAY_OF_PREFIX, wrapped_element.element_name());

        let ctor_inner = inner.clone();
        let ctor_element = element.clone();
        let desc = Arc::new_cyclic(|this: &Weak<SurrogateDesc>| {
            let this = this.clone();
            SurrogateDesc::new(
                name,
                element_name,
                SurrogateShape::Collection {
                    item: wrapped_element,
                },
                Arc::new(move || -> Result<Box<dyn Surrogate>> {
                    let desc = this.upgrade().ok_or_else(|| {
                        ReadError::Configuration("sequence surrogate type was dropped".to_string())
                    })?;
                    Ok(Box::new(DelegatingSequence::new(
                        desc,
                        ctor_element.clone(),
                        ctor_inner.clone(),
                        Vec::new(),
                    )))
                }),
            )
        });

        Ok(Self {
            declared,
            element,
            inner,
            wrapping: TypeDesc::Surrogate(desc.clone()),
            desc,
        })
    }

    /// Declared sequence type
    pub fn declared_type(&self) -> &TypeDesc {
        &self.declared
    }

    /// Declared element type
    pub fn element_type(&self) -> &TypeDesc {
        &self.element
    }

    /// Provider for the element type, if elements are wrapped too
    pub fn inner(&self) -> Option<&Arc<dyn WrapperProvider>> {
        self.inner.as_ref()
    }
}

impl WrapperProvider for SequenceWrapperProvider {
    fn wrapping_type(&self) -> &TypeDesc {
        &self.wrapping
    }

    fn wrap(&self, original: Value) -> Result<Value> {
        match original {
            Value::Null => Ok(Value::Null),
            Value::List(items) => Ok(surrogate_value(Box::new(DelegatingSequence::new(
                self.desc.clone(),
                self.element.clone(),
                self.inner.clone(),
                items,
            )))),
            other => Err(ReadError::TypeMismatch {
                expected: self.declared.to_string(),
                found: other.kind_name().to_string(),
            }),
        }
    }
}

/// Surrogate sequence: document elements of type `E'`, backing storage of `E`
#[derive(Debug, Clone)]
pub struct DelegatingSequence {
    desc: Arc<SurrogateDesc>,
    element: TypeDesc,
    inner: Option<Arc<dyn WrapperProvider>>,
    items: Vec<Value>,
}

impl DelegatingSequence {
    fn new(
        desc: Arc<SurrogateDesc>,
        element: TypeDesc,
        inner: Option<Arc<dyn WrapperProvider>>,
        items: Vec<Value>,
    ) -> Self {
        Self {
            desc,
            element,
            inner,
            items,
        }
    }

    /// Backing elements in declared shape
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

impl Surrogate for DelegatingSequence {
    fn type_desc(&self) -> TypeDesc {
        TypeDesc::Surrogate(self.desc.clone())
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn wrapped_items(&self) -> Box<dyn Iterator<Item = Result<SurrogateItem>> + '_> {
        Box::new(self.items.iter().map(move |item| {
            let wrapped = match &self.inner {
                Some(provider) => provider.wrap(item.clone())?,
                None => item.clone(),
            };
            Ok(SurrogateItem::Element(wrapped))
        }))
    }

    fn add(&mut self, item: SurrogateItem) -> Result<()> {
        match item {
            SurrogateItem::Element(value) => {
                let declared = unwrap_value(value, &self.element)?;
                self.items.push(declared);
                Ok(())
            }
            SurrogateItem::Entry { key, .. } => Err(ReadError::TypeMismatch {
                expected: format!("{} element", self.element),
                found: format!("dictionary entry '{}'", key),
            }),
        }
    }

    fn declared_value(&self) -> Value {
        Value::List(self.items.clone())
    }

    fn unwrap(self: Box<Self>, declared: &TypeDesc) -> Result<Value> {
        if declared.sequence_element() != Some(&self.element) {
            return Err(ReadError::TypeMismatch {
                expected: format!("sequence of {}", self.element),
                found: declared.to_string(),
            });
        }
        Ok(Value::List(self.items))
    }

    fn clone_box(&self) -> Box<dyn Surrogate> {
        Box::new(self.clone())
    }
}
