//! Member injection and method interception primitives.
//!
//! # Responsibility
//! - Provide the only sanctioned mutation path for extensions.
//! - Keep interceptors observers: they see copies of the call, never the
//!   real arguments or result.
//!
//! # Invariants
//! - `set` never overwrites: a name that resolves anywhere on the target is a
//!   `DuplicateMember` error.
//! - `wrap` preserves the wrapped method's `Signature` exactly.
//! - A failing `before` hook aborts the call before the original runs.

use log::debug;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{ComposeError, ComposeResult};
use crate::host::{Composable, Host, ScratchData};
use crate::model::member::{Callable, Member, MethodFn, Property};
use crate::model::signature::Arguments;
use crate::model::value::Value;

/// Payload handed to interceptor hooks for one call.
pub struct CallRecord<'h> {
    /// Name the wrapped method was installed under.
    pub method: String,
    /// The host the method was called on.
    pub host: &'h mut Host,
    /// Copy of the host's scratch data taken before the call.
    pub extension_scratch_data: ScratchData,
    pub args: Vec<Value>,
    pub kwargs: BTreeMap<String, Value>,
    /// Copy of the returned value; only set for `after` hooks.
    pub result: Option<Value>,
}

impl<'h> CallRecord<'h> {
    fn capture(method: &str, host: &'h mut Host, args: &Arguments) -> Self {
        let extension_scratch_data = host
            .scratch()
            .iter()
            .map(|(key, value)| (key.clone(), value.snapshot()))
            .collect();
        Self {
            method: method.to_string(),
            host,
            extension_scratch_data,
            args: args.positional().iter().map(Value::snapshot).collect(),
            kwargs: args
                .keyword()
                .iter()
                .map(|(key, value)| (key.clone(), value.snapshot()))
                .collect(),
            result: None,
        }
    }
}

/// Interceptor callback.
pub type Hook = Rc<dyn Fn(&mut CallRecord<'_>) -> ComposeResult<()>>;

/// Two-phase interceptor: `before` runs ahead of the original method,
/// `after` runs once the result is attached to the record.
#[derive(Clone, Default)]
pub struct Interceptor {
    before: Option<Hook>,
    after: Option<Hook>,
}

impl Interceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CallRecord<'_>) -> ComposeResult<()> + 'static,
    {
        self.before = Some(Rc::new(hook));
        self
    }

    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut CallRecord<'_>) -> ComposeResult<()> + 'static,
    {
        self.after = Some(Rc::new(hook));
        self
    }

    fn run(hook: &Option<Hook>, record: &mut CallRecord<'_>) -> ComposeResult<()> {
        match hook {
            Some(hook) => hook(record),
            None => Ok(()),
        }
    }
}

/// Installs `member` as `name` on `target`.
///
/// Callables whose signature declares `self` become instance methods; other
/// callables are stored as static functions.
pub fn set(target: &mut dyn Composable, name: &str, member: impl Into<Member>) -> ComposeResult<()> {
    let member = member.into();
    ensure_unclaimed(&*target, name)?;
    if let Member::Property(property) = &member {
        ensure_accessor(name, &property.getter)?;
        if let Some(setter) = &property.setter {
            ensure_accessor(name, setter)?;
        }
    }

    debug!(
        "event=member_set module=extension status=ok target={} name={} kind={}",
        target.type_name(),
        name,
        member.kind()
    );
    target.own_members_mut().insert(name, member);
    Ok(())
}

/// Installs a read-only property backed by `getter`.
pub fn set_property(target: &mut dyn Composable, name: &str, getter: Callable) -> ComposeResult<()> {
    set(
        target,
        name,
        Member::Property(Property {
            getter,
            setter: None,
        }),
    )
}

/// Attaches `setter` to the existing property `name`.
pub fn set_setter(target: &mut dyn Composable, name: &str, setter: Callable) -> ComposeResult<()> {
    ensure_accessor(name, &setter)?;
    let property = match target.resolve(name) {
        Some(Member::Property(property)) => property.clone(),
        Some(_) => {
            return Err(ComposeError::NotAProperty {
                name: name.to_string(),
            })
        }
        None => {
            return Err(ComposeError::MemberNotFound {
                name: name.to_string(),
                target: target.type_name().to_string(),
            })
        }
    };
    if property.setter.is_some() {
        return Err(ComposeError::DuplicateMember {
            name: format!("{name}.setter"),
            target: target.type_name().to_string(),
        });
    }

    debug!(
        "event=member_set module=extension status=ok target={} name={} kind=setter",
        target.type_name(),
        name
    );
    target.own_members_mut().insert(
        name,
        Member::Property(Property {
            getter: property.getter,
            setter: Some(setter),
        }),
    );
    Ok(())
}

/// Replaces the method `method` on `target` with an intercepted version.
pub fn wrap(target: &mut dyn Composable, method: &str, interceptor: Interceptor) -> ComposeResult<()> {
    let original = match target.resolve(method) {
        Some(Member::Callable(callable)) => callable.clone(),
        Some(_) => {
            return Err(ComposeError::NotCallable {
                name: method.to_string(),
            })
        }
        None => {
            return Err(ComposeError::MemberNotFound {
                name: method.to_string(),
                target: target.type_name().to_string(),
            })
        }
    };
    if !original.takes_self() {
        return Err(ComposeError::CannotWrapStatic {
            method: method.to_string(),
            target: target.type_name().to_string(),
        });
    }

    let signature = original.signature().clone();
    let name = method.to_string();
    let body: MethodFn = Rc::new(move |host: &mut Host, args: &Arguments| -> ComposeResult<Value> {
        let mut record = CallRecord::capture(&name, host, args);
        Interceptor::run(&interceptor.before, &mut record)?;

        let result = original.invoke_bound(&mut *record.host, args)?;
        record.result = Some(result.snapshot());
        Interceptor::run(&interceptor.after, &mut record)?;
        Ok(result)
    });

    debug!(
        "event=method_wrap module=extension status=ok target={} name={}",
        target.type_name(),
        method
    );
    target
        .own_members_mut()
        .insert(method, Member::Callable(Callable::from_method_fn(signature, body)));
    Ok(())
}

fn ensure_unclaimed(target: &dyn Composable, name: &str) -> ComposeResult<()> {
    if target.member_names().contains(name) {
        return Err(ComposeError::DuplicateMember {
            name: name.to_string(),
            target: target.type_name().to_string(),
        });
    }
    Ok(())
}

fn ensure_accessor(name: &str, accessor: &Callable) -> ComposeResult<()> {
    if !accessor.takes_self() {
        return Err(ComposeError::StaticAccessor {
            name: name.to_string(),
        });
    }
    Ok(())
}
