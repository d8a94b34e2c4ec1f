//! Host instances.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::{ComposeError, ComposeResult};
use crate::extension::{ExtensionRef, ExtensionSet};
use crate::host::host_type::HostType;
use crate::host::sealed::Sealed;
use crate::host::Composable;
use crate::model::member::{Member, MemberTable};
use crate::model::signature::{CallArgs, Signature};
use crate::model::value::Value;

/// Host-owned mapping extensions may use to coordinate during application.
pub type ScratchData = BTreeMap<String, Value>;

/// One constructed host.
pub struct Host {
    ty: Rc<HostType>,
    members: MemberTable,
    extensions: ExtensionSet,
    extension_scratch_data: ScratchData,
}

impl Host {
    pub(crate) fn new(ty: Rc<HostType>, extensions: ExtensionSet) -> Self {
        Self {
            ty,
            members: MemberTable::new(),
            extensions,
            extension_scratch_data: ScratchData::new(),
        }
    }

    pub fn host_type(&self) -> &Rc<HostType> {
        &self.ty
    }

    /// Calls the callable member `name`.
    pub fn call(&mut self, name: &str, args: CallArgs) -> ComposeResult<Value> {
        match self.lookup(name)? {
            Member::Callable(callable) => callable.invoke(name, self, args),
            _ => Err(ComposeError::NotCallable {
                name: name.to_string(),
            }),
        }
    }

    /// Reads a value or property.
    pub fn get(&mut self, name: &str) -> ComposeResult<Value> {
        match self.lookup(name)? {
            Member::Value(value) => Ok(value),
            Member::Property(property) => property.getter.invoke(name, self, CallArgs::new()),
            Member::Callable(_) => Err(ComposeError::NotAValue {
                name: name.to_string(),
            }),
        }
    }

    /// Plain attribute assignment.
    ///
    /// Routes through a property setter when `name` is a property; otherwise
    /// stores `value` as an own member, shadowing any type-level member.
    pub fn assign(&mut self, name: &str, value: impl Into<Value>) -> ComposeResult<()> {
        let value = value.into();
        if let Some(Member::Property(property)) = self.resolve(name) {
            let Some(setter) = property.setter.clone() else {
                return Err(ComposeError::ReadOnlyProperty {
                    name: name.to_string(),
                });
            };
            setter.invoke(name, self, CallArgs::new().arg(value))?;
            return Ok(());
        }
        self.members.insert(name, Member::Value(value));
        Ok(())
    }

    /// Mutable access to a plain value, copying a type-level default into
    /// the instance on first write.
    pub fn value_mut(&mut self, name: &str) -> ComposeResult<&mut Value> {
        if !self.members.contains(name) {
            let inherited = match self.ty.resolve(name) {
                Some(Member::Value(value)) => value.clone(),
                Some(_) => {
                    return Err(ComposeError::NotAValue {
                        name: name.to_string(),
                    })
                }
                None => return Err(self.not_found(name)),
            };
            self.members.insert(name, Member::Value(inherited));
        }

        match self.members.get_mut(name) {
            Some(Member::Value(value)) => Ok(value),
            Some(_) => Err(ComposeError::NotAValue {
                name: name.to_string(),
            }),
            None => Err(ComposeError::MemberNotFound {
                name: name.to_string(),
                target: self.ty.name().to_string(),
            }),
        }
    }

    /// Declared signature of a callable member.
    pub fn signature_of(&self, name: &str) -> Option<&Signature> {
        match self.resolve(name)? {
            Member::Callable(callable) => Some(callable.signature()),
            _ => None,
        }
    }

    pub fn scratch(&self) -> &ScratchData {
        &self.extension_scratch_data
    }

    pub fn scratch_mut(&mut self) -> &mut ScratchData {
        &mut self.extension_scratch_data
    }

    fn lookup(&self, name: &str) -> ComposeResult<Member> {
        self.resolve(name)
            .cloned()
            .ok_or_else(|| self.not_found(name))
    }

    fn not_found(&self, name: &str) -> ComposeError {
        ComposeError::MemberNotFound {
            name: name.to_string(),
            target: self.ty.name().to_string(),
        }
    }
}

impl Composable for Host {
    fn type_name(&self) -> &str {
        self.ty.name()
    }

    fn is_a(&self, type_name: &str) -> bool {
        self.ty.is_a(type_name)
    }

    fn resolve(&self, name: &str) -> Option<&Member> {
        self.members.get(name).or_else(|| self.ty.resolve(name))
    }

    fn member_names(&self) -> BTreeSet<String> {
        let mut names = self.ty.member_names();
        names.extend(self.members.names());
        names
    }

    fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    fn scratch_mut(&mut self) -> Option<&mut ScratchData> {
        Some(&mut self.extension_scratch_data)
    }
}

impl Sealed for Host {
    fn own_members_mut(&mut self) -> &mut MemberTable {
        &mut self.members
    }

    fn record_extension(&mut self, extension: ExtensionRef) -> bool {
        self.extensions.insert(extension)
    }
}
