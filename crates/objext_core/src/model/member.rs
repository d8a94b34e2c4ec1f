//! Host members: values, callables and properties.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::error::ComposeResult;
use crate::host::Host;
use crate::model::signature::{Arguments, CallArgs, Signature};
use crate::model::value::Value;

/// Body of an instance method.
pub type MethodFn = Rc<dyn Fn(&mut Host, &Arguments) -> ComposeResult<Value>>;
/// Body of a static function.
pub type FunctionFn = Rc<dyn Fn(&Arguments) -> ComposeResult<Value>>;

#[derive(Clone)]
enum Body {
    Method(MethodFn),
    Function(FunctionFn),
}

/// A signature paired with its body.
///
/// `Callable::method` bodies receive the host implicitly and always declare
/// the receiver; `Callable::function` bodies never do.
#[derive(Clone)]
pub struct Callable {
    signature: Signature,
    body: Body,
}

impl Callable {
    /// Instance method; `signature` lists the parameters after `self`.
    pub fn method<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&mut Host, &Arguments) -> ComposeResult<Value> + 'static,
    {
        Self::from_method_fn(signature, Rc::new(body))
    }

    pub(crate) fn from_method_fn(signature: Signature, body: MethodFn) -> Self {
        Self {
            signature: signature.with_receiver(true),
            body: Body::Method(body),
        }
    }

    /// Static function without receiver.
    pub fn function<F>(signature: Signature, body: F) -> Self
    where
        F: Fn(&Arguments) -> ComposeResult<Value> + 'static,
    {
        Self {
            signature: signature.with_receiver(false),
            body: Body::Function(Rc::new(body)),
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn takes_self(&self) -> bool {
        self.signature.takes_self()
    }

    /// Binds `call` and runs the body against `host`.
    pub fn invoke(&self, name: &str, host: &mut Host, call: CallArgs) -> ComposeResult<Value> {
        let args = self.signature.bind(name, call)?;
        self.invoke_bound(host, &args)
    }

    pub(crate) fn invoke_bound(&self, host: &mut Host, args: &Arguments) -> ComposeResult<Value> {
        match &self.body {
            Body::Method(body) => body(host, args),
            Body::Function(body) => body(args),
        }
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callable")
            .field("signature", &self.signature.parameter_names())
            .finish()
    }
}

/// Getter plus optional setter bound to one attribute name.
#[derive(Debug, Clone)]
pub struct Property {
    pub getter: Callable,
    pub setter: Option<Callable>,
}

/// One named entry in a member table.
#[derive(Debug, Clone)]
pub enum Member {
    Value(Value),
    Callable(Callable),
    Property(Property),
}

impl Member {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Value(_) => "value",
            Self::Callable(callable) if callable.takes_self() => "method",
            Self::Callable(_) => "function",
            Self::Property(_) => "property",
        }
    }
}

impl From<Callable> for Member {
    fn from(callable: Callable) -> Self {
        Self::Callable(callable)
    }
}

impl From<Value> for Member {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Name-ordered member storage owned by one type or instance.
#[derive(Debug, Clone, Default)]
pub struct MemberTable {
    entries: BTreeMap<String, Member>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Inserts or replaces `name`, returning the previous member.
    pub fn insert(&mut self, name: impl Into<String>, member: Member) -> Option<Member> {
        self.entries.insert(name.into(), member)
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
