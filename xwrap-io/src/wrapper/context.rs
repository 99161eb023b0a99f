//! Resolution context handed to wrapper provider factories

use xwrap_format::TypeDesc;

/// Declared type plus direction, created per resolution call
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperProviderContext {
    declared_type: TypeDesc,
    is_serialization: bool,
}

impl WrapperProviderContext {
    /// Create a context
    pub fn new(declared_type: TypeDesc, is_serialization: bool) -> Self {
        Self {
            declared_type,
            is_serialization,
        }
    }

    /// Context for reading (deserializing) `declared_type`
    pub fn for_read(declared_type: TypeDesc) -> Self {
        Self::new(declared_type, false)
    }

    /// Context for writing (serializing) `declared_type`
    pub fn for_write(declared_type: TypeDesc) -> Self {
        Self::new(declared_type, true)
    }

    /// Type the caller declared
    pub fn declared_type(&self) -> &TypeDesc {
        &self.declared_type
    }

    /// True when producing output
    pub fn is_serialization(&self) -> bool {
        self.is_serialization
    }

    /// Same direction, different declared type; used to resolve element types
    pub fn with_declared_type(&self, declared_type: TypeDesc) -> Self {
        Self::new(declared_type, self.is_serialization)
    }
}
