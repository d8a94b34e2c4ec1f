//! Construction-time composition of host types with extensions.
//!
//! A host type declares native members; extensions add members and wrap
//! methods through [`extension::set`] and [`extension::wrap`] while the host
//! is being composed, either once per derived type
//! ([`HostType::with_extensions`]) or once per instance
//! ([`HostType::compose`]).

pub mod error;
pub mod extension;
pub mod host;
pub mod logging;
pub mod model;

pub use error::{ComposeError, ComposeResult};
pub use extension::{
    set, set_property, set_setter, validate_extension, wrap, CallRecord, Extension,
    ExtensionCatalog, ExtensionRef, ExtensionSet, Interceptor,
};
pub use host::{
    Composable, ComposeOptions, DuplicatePolicy, Host, HostType, HostTypeBuilder, ScratchData,
    INIT,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::member::{Callable, Member, MemberTable, Property};
pub use model::signature::{Arguments, CallArgs, Param, Signature, SELF_PARAM};
pub use model::value::{CopyError, Resource, Value};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
