//! Wrapper providers
//!
//! The document serializer only constructs concrete types. When a caller asks
//! for something it cannot build (a bare sequence interface, an error
//! collection), a wrapper provider substitutes a surrogate type and converts
//! values into and out of it.
//!
//! # Resolution
//!
//! A [`WrapperProviderRegistry`] is an ordered list of factories. Resolution
//! asks each factory in turn and takes the first provider offered; there is
//! no fallback chaining and no memoization.
//!
//! # Built-in factories
//!
//! - **Sequence**: `Sequence<T>` and `Queryable<T>` become
//!   `DelegatingSequence<T', T>`, where `T'` is the surrogate of `T` if `T`
//!   itself needs one. Nesting composes recursively.
//! - **Error collection**: `Error` becomes a dictionary-shaped surrogate read
//!   from `<Error><Key>message</Key></Error>`.

pub mod context;
pub mod errors;
pub mod provider;
pub mod sequence;

pub use context::WrapperProviderContext;
pub use errors::{ErrorCollectionWrapperProvider, ErrorCollectionWrapperProviderFactory};
pub use provider::{WrapperProvider, WrapperProviderFactory, WrapperProviderRegistry};
pub use sequence::{DelegatingSequence, SequenceWrapperProvider, SequenceWrapperProviderFactory};
