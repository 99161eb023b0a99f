//! Provider and factory traits, and the ordered factory registry
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xwrap_format::TypeDesc;
//! use xwrap_io::wrapper::{WrapperProviderContext, WrapperProviderRegistry};
//!
//! let registry = WrapperProviderRegistry::with_defaults();
//! let ctx = WrapperProviderContext::for_read(TypeDesc::sequence(TypeDesc::Int));
//! let provider = registry.resolve(&ctx).unwrap().expect("sequence is wrapped");
//! assert_eq!(provider.wrapping_type().to_string(), "DelegatingSequence<int, int>");
//! ```

use super::context::WrapperProviderContext;
use super::errors::ErrorCollectionWrapperProviderFactory;
use super::sequence::SequenceWrapperProviderFactory;
use std::fmt;
use std::sync::Arc;
use xwrap_format::{ReadError, Result, TypeDesc, Value};

/// Surrogate type for one declared type, and the conversion into it
pub trait WrapperProvider: Send + Sync + fmt::Debug {
    /// Concrete type the serializer uses instead of the declared type
    fn wrapping_type(&self) -> &TypeDesc;

    /// Convert a declared-shape value into the surrogate shape
    ///
    /// `Null` maps to `Null`; any other result is an instance of
    /// [`wrapping_type`](Self::wrapping_type).
    fn wrap(&self, original: Value) -> Result<Value>;
}

/// Offers a provider for the declared types it recognizes
pub trait WrapperProviderFactory: Send + Sync {
    /// Unique name, used to replace or remove the factory
    fn name(&self) -> &str;

    /// Provider for `context`, or `None` to decline
    ///
    /// `registry` resolves nested types (sequence elements) through the same
    /// ordered list.
    fn provider(
        &self,
        context: &WrapperProviderContext,
        registry: &WrapperProviderRegistry,
    ) -> Result<Option<Arc<dyn WrapperProvider>>>;
}

/// Ordered list of wrapper provider factories
#[derive(Clone, Default)]
pub struct WrapperProviderRegistry {
    factories: Vec<Arc<dyn WrapperProviderFactory>>,
}

impl WrapperProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the sequence and error-collection factories
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.push(Arc::new(SequenceWrapperProviderFactory));
        registry.push(Arc::new(ErrorCollectionWrapperProviderFactory));
        registry
    }

    /// Append a factory (lowest priority)
    pub fn push(&mut self, factory: Arc<dyn WrapperProviderFactory>) {
        self.factories.push(factory);
    }

    /// Insert a factory at `index`; indices past the end append
    pub fn insert(&mut self, index: usize, factory: Arc<dyn WrapperProviderFactory>) {
        let index = index.min(self.factories.len());
        self.factories.insert(index, factory);
    }

    /// Replace the factory registered under `name`, keeping its position
    pub fn replace(&mut self, name: &str, factory: Arc<dyn WrapperProviderFactory>) -> Result<()> {
        match self.factories.iter_mut().find(|f| f.name() == name) {
            Some(slot) => {
                *slot = factory;
                Ok(())
            }
            None => Err(ReadError::Configuration(format!(
                "no wrapper provider factory named '{}'",
                name
            ))),
        }
    }

    /// Remove the factory registered under `name`
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn WrapperProviderFactory>> {
        let index = self.factories.iter().position(|f| f.name() == name)?;
        Some(self.factories.remove(index))
    }

    /// Factory names in resolution order
    pub fn names(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Number of factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factories are registered
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// First provider offered for `context`, in registration order
    pub fn resolve(
        &self,
        context: &WrapperProviderContext,
    ) -> Result<Option<Arc<dyn WrapperProvider>>> {
        for factory in &self.factories {
            if let Some(provider) = factory.provider(context, self)? {
                tracing::trace!(
                    factory = factory.name(),
                    declared = %context.declared_type(),
                    wrapping = %provider.wrapping_type(),
                    "wrapper provider resolved"
                );
                return Ok(Some(provider));
            }
        }
        tracing::trace!(declared = %context.declared_type(), "no wrapper provider");
        Ok(None)
    }
}

impl fmt::Debug for WrapperProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperProviderRegistry")
            .field("factories", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Identity(TypeDesc);

    impl WrapperProvider for Identity {
        fn wrapping_type(&self) -> &TypeDesc {
            &self.0
        }

        fn wrap(&self, original: Value) -> Result<Value> {
            Ok(original)
        }
    }

    /// Claims one type and counts how often it is asked
    struct Claims {
        name: &'static str,
        claims: TypeDesc,
        wrapping: TypeDesc,
        calls: AtomicUsize,
    }

    impl Claims {
        fn new(name: &'static str, claims: TypeDesc, wrapping: TypeDesc) -> Arc<Self> {
            Arc::new(Self {
                name,
                claims,
                wrapping,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl WrapperProviderFactory for Claims {
        fn name(&self) -> &str {
            self.name
        }

        fn provider(
            &self,
            context: &WrapperProviderContext,
            _registry: &WrapperProviderRegistry,
        ) -> Result<Option<Arc<dyn WrapperProvider>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if context.declared_type() == &self.claims {
                return Ok(Some(Arc::new(Identity(self.wrapping.clone()))));
            }
            Ok(None)
        }
    }

    #[test]
    fn first_claiming_factory_wins() {
        let first = Claims::new("first", TypeDesc::Int, TypeDesc::Long);
        let second = Claims::new("second", TypeDesc::Int, TypeDesc::String);
        let mut registry = WrapperProviderRegistry::new();
        registry.push(first.clone());
        registry.push(second.clone());

        let provider = registry
            .resolve(&WrapperProviderContext::for_read(TypeDesc::Int))
            .unwrap()
            .unwrap();
        assert_eq!(provider.wrapping_type(), &TypeDesc::Long);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unclaimed_type_resolves_to_none_after_asking_everyone() {
        let first = Claims::new("first", TypeDesc::Int, TypeDesc::Long);
        let second = Claims::new("second", TypeDesc::Bool, TypeDesc::String);
        let mut registry = WrapperProviderRegistry::new();
        registry.push(first.clone());
        registry.push(second.clone());

        let ctx = WrapperProviderContext::for_read(TypeDesc::Double);
        assert!(registry.resolve(&ctx).unwrap().is_none());
        assert!(registry.resolve(&ctx).unwrap().is_none());
        assert_eq!(first.calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn insert_and_replace_keep_order() {
        let mut registry = WrapperProviderRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["sequence", "error-collection"]);

        registry.insert(0, Claims::new("custom", TypeDesc::Int, TypeDesc::Long));
        assert_eq!(registry.names(), vec!["custom", "sequence", "error-collection"]);

        registry
            .replace("sequence", Claims::new("other", TypeDesc::Bool, TypeDesc::Int))
            .unwrap();
        assert_eq!(registry.names(), vec!["custom", "other", "error-collection"]);

        let err = registry
            .replace("missing", Claims::new("x", TypeDesc::Int, TypeDesc::Int))
            .unwrap_err();
        assert!(err.is_configuration());

        assert!(registry.remove("custom").is_some());
        assert_eq!(registry.len(), 2);
    }
}
