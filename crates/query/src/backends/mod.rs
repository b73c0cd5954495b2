//! Backend Abstractions
//!
//! Collaborator interfaces implemented by the host application.

pub mod core;

pub use self::core::*;
