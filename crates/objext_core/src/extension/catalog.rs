//! In-process extension catalog.
//!
//! Lets callers select extensions by id instead of holding the definitions.

use log::debug;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{ComposeError, ComposeResult};
use crate::extension::contract::{validate_extension, ExtensionRef};

/// Registry of extension definitions keyed by id.
#[derive(Default)]
pub struct ExtensionCatalog {
    entries: BTreeMap<String, ExtensionRef>,
}

impl ExtensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one extension after contract validation.
    pub fn register(&mut self, extension: ExtensionRef) -> ComposeResult<()> {
        validate_extension(extension.as_ref())?;
        let id = extension.id().to_string();
        if self.entries.contains_key(id.as_str()) {
            return Err(ComposeError::DuplicateExtension(id));
        }

        debug!("event=extension_register module=catalog status=ok extension={id}");
        self.entries.insert(id, extension);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ExtensionRef> {
        self.entries.get(id)
    }

    /// Sorted registered ids.
    pub fn ids(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Resolves `ids` in order; unknown ids are not extensions.
    pub fn resolve_all(&self, ids: &[&str]) -> ComposeResult<Vec<ExtensionRef>> {
        ids.iter()
            .map(|id| id.trim())
            .map(|id| {
                self.get(id)
                    .map(Rc::clone)
                    .ok_or_else(|| ComposeError::NotAnExtension {
                        module: id.to_string(),
                    })
            })
            .collect()
    }
}
