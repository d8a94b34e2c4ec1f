//! Explicit call signatures and argument binding.
//!
//! # Responsibility
//! - Describe the declared parameter list of every host callable.
//! - Bind raw positional/keyword arguments against that list.
//!
//! # Invariants
//! - A signature is captured once and copied verbatim by wrappers, so
//!   introspection of a wrapped method sees the original parameter list.
//! - The receiver (`self`) is never supplied by callers; it is implicit.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{ComposeError, ComposeResult};
use crate::model::value::Value;

/// Conventional name of the self-reference parameter.
pub const SELF_PARAM: &str = "self";

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    /// Default used when the caller omits the argument.
    pub default: Option<Value>,
}

/// Declared parameter list of a callable.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Signature {
    receiver: bool,
    params: Vec<Param>,
}

impl Signature {
    /// Empty parameter list without receiver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required parameter.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Adds a parameter with a default value.
    pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.params.push(Param {
            name: name.into(),
            default: Some(default.into()),
        });
        self
    }

    pub(crate) fn with_receiver(mut self, receiver: bool) -> Self {
        self.receiver = receiver;
        self
    }

    /// Returns whether the first declared parameter is `self`.
    pub fn takes_self(&self) -> bool {
        self.receiver
    }

    /// Parameters after the receiver.
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Full declared parameter names, receiver first when present.
    pub fn parameter_names(&self) -> Vec<&str> {
        let receiver: Option<&str> = self.receiver.then_some(SELF_PARAM);
        receiver
            .into_iter()
            .chain(self.params.iter().map(|param| param.name.as_str()))
            .collect()
    }

    /// Declared parameter defaults, keyed by name.
    pub fn defaults(&self) -> BTreeMap<&str, &Value> {
        self.params
            .iter()
            .filter_map(|param| param.default.as_ref().map(|value| (param.name.as_str(), value)))
            .collect()
    }

    /// Number of explicit parameters (receiver excluded).
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Binds one call against this signature.
    pub fn bind(&self, callable: &str, call: CallArgs) -> ComposeResult<Arguments> {
        if call.positional.len() > self.params.len() {
            return Err(ComposeError::TooManyArguments {
                callable: callable.to_string(),
                expected: self.params.len(),
                given: call.positional.len(),
            });
        }

        let mut bound = BTreeMap::new();
        for (param, value) in self.params.iter().zip(call.positional.iter()) {
            bound.insert(param.name.clone(), value.clone());
        }

        for (keyword, value) in &call.keyword {
            if !self.params.iter().any(|param| &param.name == keyword) {
                return Err(ComposeError::UnexpectedKeyword {
                    callable: callable.to_string(),
                    keyword: keyword.clone(),
                });
            }
            if bound.insert(keyword.clone(), value.clone()).is_some() {
                return Err(ComposeError::DuplicateArgument {
                    callable: callable.to_string(),
                    param: keyword.clone(),
                });
            }
        }

        for param in &self.params {
            if bound.contains_key(param.name.as_str()) {
                continue;
            }
            match &param.default {
                Some(default) => {
                    bound.insert(param.name.clone(), default.clone());
                }
                None => {
                    return Err(ComposeError::MissingArgument {
                        callable: callable.to_string(),
                        param: param.name.clone(),
                    })
                }
            }
        }

        Ok(Arguments { call, bound })
    }
}

/// Raw arguments of a single call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }
}

impl<V: Into<Value>> FromIterator<V> for CallArgs {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            positional: iter.into_iter().map(Into::into).collect(),
            keyword: BTreeMap::new(),
        }
    }
}

/// Arguments after binding: the raw call plus the by-name view.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments {
    call: CallArgs,
    bound: BTreeMap<String, Value>,
}

impl Arguments {
    /// Bound value for a declared parameter.
    pub fn get(&self, name: &str) -> ComposeResult<&Value> {
        self.bound
            .get(name)
            .ok_or_else(|| ComposeError::failed(format!("argument `{name}` is not bound")))
    }

    pub fn call(&self) -> &CallArgs {
        &self.call
    }

    pub fn positional(&self) -> &[Value] {
        &self.call.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.call.keyword
    }
}
