//! Error taxonomy.
//!
//! Configuration errors are fatal at declaration/wiring time and never occur
//! during mutation traffic. Runtime errors carry a stable internal
//! classification; navigation misses are not errors at all.

use crate::ident::{EntityName, EntityNameError, Ident, IdentError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// ConfigError
///
/// Declaration- and wiring-time failures. Unrecoverable; meant to stop
/// application startup before any mutation traffic.
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ConfigError {
    #[error("attribute '{attribute}' on '{entity}' redeclared with different options")]
    ConflictingAttribute { entity: EntityName, attribute: Ident },

    #[error("provider '{provider}' registered twice for '{entity}'")]
    DuplicateProvider { entity: EntityName, provider: String },

    #[error(transparent)]
    EntityName(#[from] EntityNameError),

    #[error(transparent)]
    Ident(#[from] IdentError),

    #[error("relationship '{relationship}' on '{entity}' carries no inverse name")]
    MissingInverse {
        entity: EntityName,
        relationship: Ident,
    },

    #[error(
        "assigned computed attribute '{attribute}' on '{entity}', but no provider named '{provider}' is registered"
    )]
    MissingProvider {
        entity: EntityName,
        attribute: Ident,
        provider: String,
    },

    #[error("relationship '{relationship}' on '{entity}' carries no target entity")]
    MissingTarget {
        entity: EntityName,
        relationship: Ident,
    },

    #[error("through relationship '{relationship}' on '{entity}' carries no through chain")]
    MissingThrough {
        entity: EntityName,
        relationship: Ident,
    },

    #[error(
        "through relationship '{relationship}' on '{entity}': grandchild '{grandchild}' has no owned-singular relationship back to '{child}'"
    )]
    MissingThroughHop {
        entity: EntityName,
        relationship: Ident,
        grandchild: EntityName,
        child: EntityName,
    },

    #[error("'all' is a reserved word and cannot be used as an attribute name")]
    ReservedAttributeName,

    #[error(
        "dependency '{dependency}' for attribute '{attribute}' on '{entity}' matches no relationship or column"
    )]
    UnknownDependency {
        entity: EntityName,
        attribute: Ident,
        dependency: Ident,
    },
}

///
/// ErrorTree
///
/// Route-tagged aggregation of configuration errors. Wiring collects every
/// failure across every entity before startup is aborted.
///

#[derive(Debug, Default)]
pub struct ErrorTree {
    errors: Vec<(String, ConfigError)>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, route: impl Into<String>, err: ConfigError) {
        self.errors.push((route.into(), err));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ConfigError)> {
        self.errors.iter()
    }

    /// Collapse into a result: `Ok` when nothing was collected.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s)", self.errors.len())?;
        for (route, err) in &self.errors {
            write!(f, "\n  {route}: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorTree {}

///
/// BuildError
///

#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error("wiring validation failed: {0}")]
    Validation(ErrorTree),
}

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl InternalError {
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }

    /// Construct a store-origin not-found error.
    pub fn store_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorClass::NotFound,
            ErrorOrigin::Store,
            format!("record not found: {id}"),
        )
    }

    /// Construct a store-origin internal error.
    pub fn store_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Store, message.into())
    }

    /// Construct a provider-origin internal error.
    pub fn provider_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Provider, message.into())
    }

    /// Construct a recompute-origin invariant violation.
    pub(crate) fn recompute_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Recompute,
            message.into(),
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    NotFound,
    Internal,
    Unsupported,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Unsupported => "unsupported",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Store,
    Provider,
    Hook,
    Recompute,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Store => "store",
            Self::Provider => "provider",
            Self::Hook => "hook",
            Self::Recompute => "recompute",
        };
        write!(f, "{label}")
    }
}
