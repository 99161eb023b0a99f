//! Error-collection wrapper provider
//!
//! An error collection maps keys to messages and has no constructible shape
//! of its own. Its surrogate is a dictionary read from
//! `<Error><Key>message</Key></Error>`; a repeated key appends a message.

use super::context::WrapperProviderContext;
use super::provider::{WrapperProvider, WrapperProviderFactory, WrapperProviderRegistry};
use std::sync::{Arc, Weak};
use xwrap_format::constants::ERROR_ELEMENT;
use xwrap_format::{
    surrogate_value, ErrorMap, ReadError, Result, Surrogate, SurrogateDesc, SurrogateItem,
    SurrogateShape, TypeDesc, Value,
};

/// Claims [`TypeDesc::ErrorCollection`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCollectionWrapperProviderFactory;

impl WrapperProviderFactory for ErrorCollectionWrapperProviderFactory {
    fn name(&self) -> &str {
        "error-collection"
    }

    fn provider(
        &self,
        context: &WrapperProviderContext,
        _registry: &WrapperProviderRegistry,
    ) -> Result<Option<Arc<dyn WrapperProvider>>> {
        match context.declared_type() {
            TypeDesc::ErrorCollection => Ok(Some(Arc::new(ErrorCollectionWrapperProvider::new()))),
            _ => Ok(None),
        }
    }
}

/// Provider wrapping error collections into [`SerializableErrors`]
#[derive(Debug, Clone)]
pub struct ErrorCollectionWrapperProvider {
    desc: Arc<SurrogateDesc>,
    wrapping: TypeDesc,
}

impl ErrorCollectionWrapperProvider {
    /// Create the provider and its surrogate type
    pub fn new() -> Self {
        let desc = Arc::new_cyclic(|this: &Weak<SurrogateDesc>| {
            let this = this.clone();
            SurrogateDesc::new(
                "SerializableErrors",
                ERROR_ELEMENT,
                SurrogateShape::Dictionary {
                    value: TypeDesc::optional(TypeDesc::String),
                },
                Arc::new(move || -> Result<Box<dyn Surrogate>> {
                    let desc = this.upgrade().ok_or_else(|| {
                        ReadError::Configuration("error surrogate type was dropped".to_string())
                    })?;
                    Ok(Box::new(SerializableErrors::new(desc, ErrorMap::new())))
                }),
            )
        });
        Self {
            wrapping: TypeDesc::Surrogate(desc.clone()),
            desc,
        }
    }
}

impl Default for ErrorCollectionWrapperProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WrapperProvider for ErrorCollectionWrapperProvider {
    fn wrapping_type(&self) -> &TypeDesc {
        &self.wrapping
    }

    fn wrap(&self, original: Value) -> Result<Value> {
        match original {
            Value::Null => Ok(Value::Null),
            Value::Errors(errors) => Ok(surrogate_value(Box::new(SerializableErrors::new(
                self.desc.clone(),
                errors,
            )))),
            other => Err(ReadError::TypeMismatch {
                expected: "error collection".to_string(),
                found: other.kind_name().to_string(),
            }),
        }
    }
}

/// Dictionary surrogate for an error collection
#[derive(Debug, Clone)]
pub struct SerializableErrors {
    desc: Arc<SurrogateDesc>,
    errors: ErrorMap,
}

impl SerializableErrors {
    fn new(desc: Arc<SurrogateDesc>, errors: ErrorMap) -> Self {
        Self { desc, errors }
    }

    /// Collected messages by key
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }
}

impl Surrogate for SerializableErrors {
    fn type_desc(&self) -> TypeDesc {
        TypeDesc::Surrogate(self.desc.clone())
    }

    fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    fn wrapped_items(&self) -> Box<dyn Iterator<Item = Result<SurrogateItem>> + '_> {
        Box::new(self.errors.iter().flat_map(|(key, messages)| {
            messages.iter().map(move |message| {
                Ok(SurrogateItem::Entry {
                    key: key.clone(),
                    value: Value::String(message.clone()),
                })
            })
        }))
    }

    fn add(&mut self, item: SurrogateItem) -> Result<()> {
        match item {
            SurrogateItem::Entry { key, value } => {
                let messages = self.errors.entry(key).or_default();
                match value {
                    Value::String(message) => messages.push(message),
                    Value::Null => {}
                    other => {
                        return Err(ReadError::TypeMismatch {
                            expected: "error message".to_string(),
                            found: other.kind_name().to_string(),
                        })
                    }
                }
                Ok(())
            }
            SurrogateItem::Element(value) => Err(ReadError::TypeMismatch {
                expected: "keyed error entry".to_string(),
                found: value.kind_name().to_string(),
            }),
        }
    }

    fn declared_value(&self) -> Value {
        Value::Errors(self.errors.clone())
    }

    fn unwrap(self: Box<Self>, declared: &TypeDesc) -> Result<Value> {
        match declared {
            TypeDesc::ErrorCollection => Ok(Value::Errors(self.errors)),
            other => Err(ReadError::TypeMismatch {
                expected: "error collection".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn clone_box(&self) -> Box<dyn Surrogate> {
        Box::new(self.clone())
    }
}
