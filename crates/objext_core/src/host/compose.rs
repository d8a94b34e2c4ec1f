//! Shared extension application engine.
//!
//! # Invariants
//! - Extensions are applied strictly in the supplied order, one at a time.
//! - Per extension: contract check, `can_extend`, `extend`, then record.
//! - A failure stops application; earlier extensions stay applied.

use log::{debug, warn};
use serde::Deserialize;
use std::rc::Rc;

use crate::error::{ComposeError, ComposeResult};
use crate::extension::{validate_extension, ExtensionRef};
use crate::host::Composable;

/// How a repeated extension id in one composition is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Apply the first occurrence only.
    #[default]
    Coalesce,
    /// Fail with `DuplicateExtension`.
    Reject,
}

/// Composition settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    pub duplicates: DuplicatePolicy,
}

impl ComposeOptions {
    pub fn rejecting_duplicates() -> Self {
        Self {
            duplicates: DuplicatePolicy::Reject,
        }
    }
}

pub(crate) fn apply_extensions(
    target: &mut dyn Composable,
    extensions: &[ExtensionRef],
    options: &ComposeOptions,
) -> ComposeResult<()> {
    for extension in extensions {
        validate_extension(extension.as_ref())?;
        let id = extension.id();

        if target.extensions().contains(id) {
            match options.duplicates {
                DuplicatePolicy::Reject => {
                    return Err(ComposeError::DuplicateExtension(id.to_string()));
                }
                DuplicatePolicy::Coalesce => {
                    warn!(
                        "event=extension_apply module=compose status=skipped reason=duplicate extension={} target={}",
                        id,
                        target.type_name()
                    );
                    continue;
                }
            }
        }

        if !extension.can_extend(&*target) {
            return Err(ComposeError::IncompatibleExtension {
                extension: id.to_string(),
                target: target.type_name().to_string(),
            });
        }

        extension.extend(target)?;
        target.record_extension(Rc::clone(extension));
        debug!(
            "event=extension_apply module=compose status=ok extension={} target={}",
            id,
            target.type_name()
        );
    }
    Ok(())
}
