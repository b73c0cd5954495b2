//! SQL Generation
//!
//! Compiles builder state into SQL text with placeholder tokens and the
//! matching ordered bindings.

pub mod binding;
pub mod compiler;

pub use binding::{Binding, CompiledQuery, PlaceholderKind, PlaceholderStyle};
pub use compiler::Compiler;
