//! Host types: native member declarations and type-level derivation.

use log::info;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::{ComposeError, ComposeResult};
use crate::extension::{ExtensionCatalog, ExtensionRef, ExtensionSet};
use crate::host::compose::{apply_extensions, ComposeOptions};
use crate::host::instance::{Host, ScratchData};
use crate::host::sealed::Sealed;
use crate::host::Composable;
use crate::model::member::{Callable, Member, MemberTable, Property};
use crate::model::signature::{Arguments, CallArgs, Signature};
use crate::model::value::Value;

/// Name of the constructor method run by `instantiate` and `compose`.
pub const INIT: &str = "init";

/// A named host type.
///
/// Base types come from [`HostTypeBuilder`]; derived types come from
/// [`HostType::with_extensions`] and share every base member.
pub struct HostType {
    name: String,
    base: Option<Rc<HostType>>,
    members: MemberTable,
    extensions: ExtensionSet,
    /// Coordination area for extensions; present only while a derivation runs.
    scratch: Option<ScratchData>,
}

impl HostType {
    pub fn builder(name: impl Into<String>) -> HostTypeBuilder {
        HostTypeBuilder {
            name: name.into(),
            members: MemberTable::new(),
            error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&Rc<HostType>> {
        self.base.as_ref()
    }

    /// Derives a type with `extensions` baked in.
    ///
    /// `self` is left untouched; every instance of the derived type shares
    /// the applied extensions.
    pub fn with_extensions(self: &Rc<Self>, extensions: &[ExtensionRef]) -> ComposeResult<Rc<Self>> {
        self.with_extensions_opts(extensions, &ComposeOptions::default())
    }

    pub fn with_extensions_opts(
        self: &Rc<Self>,
        extensions: &[ExtensionRef],
        options: &ComposeOptions,
    ) -> ComposeResult<Rc<Self>> {
        let mut derived = HostType {
            name: self.name.clone(),
            base: Some(Rc::clone(self)),
            members: MemberTable::new(),
            extensions: self.extensions.clone(),
            scratch: Some(ScratchData::new()),
        };
        apply_extensions(&mut derived, extensions, options)?;
        derived.scratch = None;
        info!(
            "event=type_derive module=host status=ok type={} extensions={}",
            derived.name,
            derived.extensions.ids().join(",")
        );
        Ok(Rc::new(derived))
    }

    /// Derives a type from extension ids registered in `catalog`.
    pub fn with_named_extensions(
        self: &Rc<Self>,
        catalog: &ExtensionCatalog,
        ids: &[&str],
    ) -> ComposeResult<Rc<Self>> {
        let extensions = catalog.resolve_all(ids)?;
        self.with_extensions(&extensions)
    }

    /// Constructs an instance and runs its (possibly wrapped) `init`.
    pub fn instantiate(self: &Rc<Self>, args: CallArgs) -> ComposeResult<Host> {
        let mut host = Host::new(Rc::clone(self), self.extensions.clone());
        host.call(INIT, args)?;
        info!(
            "event=host_init module=host status=ok type={} granularity=type extensions={}",
            self.name,
            host.extensions().len()
        );
        Ok(host)
    }

    /// Instance-level composition: applies `extensions` to a fresh instance
    /// only, then runs `init`.
    pub fn compose(self: &Rc<Self>, extensions: &[ExtensionRef], args: CallArgs) -> ComposeResult<Host> {
        self.compose_opts(extensions, args, &ComposeOptions::default())
    }

    pub fn compose_opts(
        self: &Rc<Self>,
        extensions: &[ExtensionRef],
        args: CallArgs,
        options: &ComposeOptions,
    ) -> ComposeResult<Host> {
        if !self.extensions.is_empty() {
            return Err(ComposeError::MixedGranularity {
                target: self.name.clone(),
            });
        }

        let mut host = Host::new(Rc::clone(self), ExtensionSet::new());
        apply_extensions(&mut host, extensions, options)?;
        host.call(INIT, args)?;
        info!(
            "event=host_init module=host status=ok type={} granularity=instance extensions={}",
            self.name,
            host.extensions().len()
        );
        Ok(host)
    }
}

impl Composable for HostType {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn is_a(&self, type_name: &str) -> bool {
        self.name == type_name
            || self
                .base
                .as_ref()
                .is_some_and(|base| base.is_a(type_name))
    }

    fn resolve(&self, name: &str) -> Option<&Member> {
        self.members
            .get(name)
            .or_else(|| self.base.as_ref().and_then(|base| base.resolve(name)))
    }

    fn member_names(&self) -> BTreeSet<String> {
        let mut names = self
            .base
            .as_ref()
            .map(|base| base.member_names())
            .unwrap_or_default();
        names.extend(self.members.names());
        names
    }

    fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    fn scratch_mut(&mut self) -> Option<&mut ScratchData> {
        self.scratch.as_mut()
    }
}

impl Sealed for HostType {
    fn own_members_mut(&mut self) -> &mut MemberTable {
        &mut self.members
    }

    fn record_extension(&mut self, extension: ExtensionRef) -> bool {
        self.extensions.insert(extension)
    }
}

/// Declares the native members of a base host type.
pub struct HostTypeBuilder {
    name: String,
    members: MemberTable,
    error: Option<ComposeError>,
}

impl HostTypeBuilder {
    /// Constructor body, run after extensions are applied.
    pub fn init<F>(self, signature: Signature, body: F) -> Self
    where
        F: Fn(&mut Host, &Arguments) -> ComposeResult<Value> + 'static,
    {
        self.member(INIT, Callable::method(signature, body))
    }

    pub fn method<F>(self, name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(&mut Host, &Arguments) -> ComposeResult<Value> + 'static,
    {
        self.member(name, Callable::method(signature, body))
    }

    pub fn function<F>(self, name: &str, signature: Signature, body: F) -> Self
    where
        F: Fn(&Arguments) -> ComposeResult<Value> + 'static,
    {
        self.member(name, Callable::function(signature, body))
    }

    /// Type-level default value, shared until an instance assigns its own.
    pub fn value(self, name: &str, value: impl Into<Value>) -> Self {
        self.member(name, Member::Value(value.into()))
    }

    pub fn property(self, name: &str, getter: Callable, setter: Option<Callable>) -> Self {
        self.member(name, Member::Property(Property { getter, setter }))
    }

    pub fn member(mut self, name: &str, member: impl Into<Member>) -> Self {
        if self.error.is_some() {
            return self;
        }
        if self.members.contains(name) {
            self.error = Some(ComposeError::DuplicateMember {
                name: name.to_string(),
                target: self.name.clone(),
            });
            return self;
        }
        self.members.insert(name, member.into());
        self
    }

    pub fn build(mut self) -> ComposeResult<Rc<HostType>> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.members.contains(INIT) {
            self.members.insert(
                INIT,
                Member::Callable(Callable::method(Signature::new(), |_, _| Ok(Value::Null))),
            );
        }
        Ok(Rc::new(HostType {
            name: self.name,
            base: None,
            members: self.members,
            extensions: ExtensionSet::new(),
            scratch: None,
        }))
    }
}
