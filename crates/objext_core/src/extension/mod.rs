//! Extension contract and mutation primitives.
//!
//! This module defines how extensions declare applicability, how they mutate
//! a composable host (`set`, `wrap`, property accessors) and an optional
//! catalog for selecting extensions by id.

pub mod catalog;
pub mod contract;
pub mod primitives;

pub use catalog::ExtensionCatalog;
pub use contract::{validate_extension, Extension, ExtensionRef, ExtensionSet};
pub use primitives::{set, set_property, set_setter, wrap, CallRecord, Hook, Interceptor};
