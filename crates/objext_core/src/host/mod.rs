//! Composable host contract.
//!
//! # Responsibility
//! - Define the lookup surface extensions see during composition.
//! - Provide the two composition granularities: type-level derivation
//!   (`HostType::with_extensions`) and instance-level composition
//!   (`HostType::compose`).
//!
//! # Invariants
//! - Only the injection/wrapping primitives mutate member tables during
//!   composition; the mutation hooks are sealed inside this crate.
//! - The applied extension set is fixed once construction completes.
//! - Member lookup walks instance -> type -> base type.

pub mod compose;
pub mod host_type;
pub mod instance;

pub use compose::{ComposeOptions, DuplicatePolicy};
pub use host_type::{HostType, HostTypeBuilder, INIT};
pub use instance::{Host, ScratchData};

use std::collections::BTreeSet;

use crate::extension::ExtensionSet;
use crate::model::member::Member;

/// Read surface shared by host types and host instances.
pub trait Composable: sealed::Sealed {
    /// Name of the (base) type under extension.
    fn type_name(&self) -> &str;

    /// Returns whether this target is, or derives from, `type_name`.
    fn is_a(&self, type_name: &str) -> bool;

    /// Resolves `name` through the full lookup chain.
    fn resolve(&self, name: &str) -> Option<&Member>;

    /// Snapshot of every name that currently resolves.
    fn member_names(&self) -> BTreeSet<String>;

    /// Extensions applied so far.
    fn extensions(&self) -> &ExtensionSet;

    /// Transient coordination area; host types carry one only while
    /// extensions are being applied to them.
    fn scratch_mut(&mut self) -> Option<&mut ScratchData>;

    fn has_member(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }
}

pub(crate) mod sealed {
    use crate::extension::ExtensionRef;
    use crate::model::member::MemberTable;

    pub trait Sealed {
        fn own_members_mut(&mut self) -> &mut MemberTable;
        fn record_extension(&mut self, extension: ExtensionRef) -> bool;
    }
}
