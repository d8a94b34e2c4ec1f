//! Composition and invocation errors.
//!
//! # Responsibility
//! - Provide one error taxonomy for construction-time composition failures
//!   and for calls routed through the host member table.
//!
//! # Invariants
//! - Construction errors are fatal to the construction attempt; the partially
//!   composed host is never handed back to the caller.

use thiserror::Error;

pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors raised while composing a host or calling one of its members.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComposeError {
    /// The supplied module does not satisfy the extension contract.
    #[error("`{module}` is not an extension")]
    NotAnExtension { module: String },

    /// `can_extend` rejected the target.
    #[error("extension `{extension}` cannot extend `{target}`")]
    IncompatibleExtension { extension: String, target: String },

    /// Member injection collided with a name that already resolves.
    #[error("member `{name}` already exists on `{target}`")]
    DuplicateMember { name: String, target: String },

    /// Wrapping targeted a callable without a receiver.
    #[error("cannot wrap `{method}` on `{target}`: it does not take `self`")]
    CannotWrapStatic { method: String, target: String },

    /// The same extension id was listed or registered twice.
    #[error("extension `{0}` was supplied more than once")]
    DuplicateExtension(String),

    /// Instance-level composition was requested on a type that already
    /// carries type-level extensions.
    #[error("`{target}` already carries type-level extensions; instance-level composition is not allowed")]
    MixedGranularity { target: String },

    #[error("member `{name}` not found on `{target}`")]
    MemberNotFound { name: String, target: String },

    #[error("member `{name}` is not callable")]
    NotCallable { name: String },

    #[error("member `{name}` is not a property")]
    NotAProperty { name: String },

    /// Property accessors must take `self`.
    #[error("accessor for property `{name}` does not take `self`")]
    StaticAccessor { name: String },

    #[error("property `{name}` has no setter")]
    ReadOnlyProperty { name: String },

    #[error("member `{name}` is not a plain value")]
    NotAValue { name: String },

    #[error("`{callable}` takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        callable: String,
        expected: usize,
        given: usize,
    },

    #[error("`{callable}` got an unexpected keyword argument `{keyword}`")]
    UnexpectedKeyword { callable: String, keyword: String },

    #[error("`{callable}` got multiple values for argument `{param}`")]
    DuplicateArgument { callable: String, param: String },

    #[error("`{callable}` missing required argument `{param}`")]
    MissingArgument { callable: String, param: String },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Domain failure raised by a member body or an interceptor.
    #[error("{0}")]
    Failed(String),
}

impl ComposeError {
    /// Builds a domain failure from any displayable message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Returns whether this error belongs to the construction taxonomy.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NotAnExtension { .. }
                | Self::IncompatibleExtension { .. }
                | Self::DuplicateMember { .. }
                | Self::CannotWrapStatic { .. }
                | Self::DuplicateExtension(_)
                | Self::MixedGranularity { .. }
        )
    }
}
