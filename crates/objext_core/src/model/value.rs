//! Dynamic values carried by host members, call arguments and results.
//!
//! # Responsibility
//! - Provide the payload shape shared by injected members and call records.
//! - Separate strict deep copies from the shared-handle fallback.
//!
//! # Invariants
//! - `deep_copy` never shares mutable state with the source value.
//! - `Resource` handles are never deep-copied; `snapshot` shares them.

use log::debug;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use thiserror::Error;

use crate::error::{ComposeError, ComposeResult};

/// Dynamic member or argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Opaque handle to a resource that cannot be copied (file, socket, ...).
    #[serde(skip)]
    Resource(Resource),
}

/// Shared, non-copyable handle.
#[derive(Clone)]
pub struct Resource(Rc<dyn Any>);

impl Resource {
    pub fn new<T: Any>(inner: T) -> Self {
        Self(Rc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns whether both handles point at the same resource.
    pub fn same_as(&self, other: &Resource) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Resource({:p})", Rc::as_ptr(&self.0))
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// Raised when a value holds a resource handle and cannot be deep-copied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("value contains a resource handle and cannot be deep-copied")]
pub struct CopyError;

impl Value {
    /// Copies the value without sharing any handle with the source.
    pub fn deep_copy(&self) -> Result<Value, CopyError> {
        match self {
            Self::Resource(_) => Err(CopyError),
            Self::List(items) => items
                .iter()
                .map(Value::deep_copy)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Self::Map(entries) => entries
                .iter()
                .map(|(key, value)| Ok((key.clone(), value.deep_copy()?)))
                .collect::<Result<BTreeMap<_, _>, CopyError>>()
                .map(Value::Map),
            other => Ok(other.clone()),
        }
    }

    /// Deep copy when possible, shared copy otherwise.
    pub fn snapshot(&self) -> Value {
        match self.deep_copy() {
            Ok(copy) => copy,
            Err(err) => {
                debug!("event=value_snapshot module=model status=fallback reason=\"{err}\"");
                self.clone()
            }
        }
    }

    /// Short type label used in mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Resource(_) => "resource",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> ComposeResult<bool> {
        match self {
            Self::Bool(value) => Ok(*value),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_int(&self) -> ComposeResult<i64> {
        match self {
            Self::Int(value) => Ok(*value),
            other => Err(mismatch("int", other)),
        }
    }

    pub fn as_float(&self) -> ComposeResult<f64> {
        match self {
            Self::Float(value) => Ok(*value),
            Self::Int(value) => Ok(*value as f64),
            other => Err(mismatch("float", other)),
        }
    }

    pub fn as_str(&self) -> ComposeResult<&str> {
        match self {
            Self::Str(value) => Ok(value.as_str()),
            other => Err(mismatch("str", other)),
        }
    }

    pub fn as_list(&self) -> ComposeResult<&[Value]> {
        match self {
            Self::List(items) => Ok(items.as_slice()),
            other => Err(mismatch("list", other)),
        }
    }

    pub fn as_list_mut(&mut self) -> ComposeResult<&mut Vec<Value>> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(mismatch("list", other)),
        }
    }

    pub fn as_map(&self) -> ComposeResult<&BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Ok(entries),
            other => Err(mismatch("map", other)),
        }
    }

    pub fn as_map_mut(&mut self) -> ComposeResult<&mut BTreeMap<String, Value>> {
        match self {
            Self::Map(entries) => Ok(entries),
            other => Err(mismatch("map", other)),
        }
    }

    pub fn as_resource(&self) -> ComposeResult<&Resource> {
        match self {
            Self::Resource(handle) => Ok(handle),
            other => Err(mismatch("resource", other)),
        }
    }

    /// Stable text key for map lookups keyed by value.
    pub fn key(&self) -> String {
        match self {
            Self::Str(value) => value.clone(),
            Self::Null => "null".to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            other => format!("{other:?}"),
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> ComposeError {
    ComposeError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

impl From<Resource> for Value {
    fn from(value: Resource) -> Self {
        Self::Resource(value)
    }
}
