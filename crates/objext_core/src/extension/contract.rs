//! Extension contract and the applied-extension set.
//!
//! # Responsibility
//! - Declare how an extension participates in host composition.
//! - Validate that a supplied module satisfies the contract.
//!
//! # Invariants
//! - Extensions are identified by `id`; equality and set membership use it.
//! - Extensions hold no reference to the hosts they extend.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use crate::error::{ComposeError, ComposeResult};
use crate::host::Composable;

/// A stateless module that augments composable hosts.
pub trait Extension {
    /// Stable identity, e.g. `listener` or `metrics.append-count`.
    fn id(&self) -> &str;

    /// Pure compatibility check, called once before `extend`.
    fn can_extend(&self, target: &dyn Composable) -> bool;

    /// Mutates `target` through [`set`](crate::extension::set),
    /// [`wrap`](crate::extension::wrap) and the property primitives only.
    fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()>;
}

/// Shared handle to an extension definition.
pub type ExtensionRef = Rc<dyn Extension>;

/// Checks that `extension` satisfies the contract.
///
/// A module whose identity is not a well-formed extension id cannot take part
/// in set membership or diagnostics and is rejected.
pub fn validate_extension(extension: &dyn Extension) -> ComposeResult<()> {
    let id = extension.id();
    if !is_valid_extension_id(id) {
        return Err(ComposeError::NotAnExtension {
            module: id.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn is_valid_extension_id(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }

    let mut prev_separator = false;
    for c in chars {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            prev_separator = false;
        } else if matches!(c, '.' | '_' | '-') && !prev_separator {
            prev_separator = true;
        } else {
            return false;
        }
    }
    !prev_separator
}

/// Order-independent set of applied extensions.
#[derive(Clone, Default)]
pub struct ExtensionSet {
    entries: BTreeMap<String, ExtensionRef>,
}

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `extension`; returns `false` when its id was already present.
    pub(crate) fn insert(&mut self, extension: ExtensionRef) -> bool {
        let id = extension.id().to_string();
        if self.entries.contains_key(id.as_str()) {
            return false;
        }
        self.entries.insert(id, extension);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ExtensionRef> {
        self.entries.get(id)
    }

    /// Sorted extension ids.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionRef> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for ExtensionSet {
    fn eq(&self, other: &Self) -> bool {
        self.ids() == other.ids()
    }
}

impl Eq for ExtensionSet {}

impl Debug for ExtensionSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl FromIterator<ExtensionRef> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = ExtensionRef>>(iter: I) -> Self {
        let mut set = Self::new();
        for extension in iter {
            set.insert(extension);
        }
        set
    }
}
