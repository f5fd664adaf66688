//! Identifier invariants and construction.
//!
//! Invariants:
//! - Identifiers are ASCII snake_case, non-empty, and bounded by MAX_* limits.
//! - All construction paths validate invariants.

use crate::{MAX_ENTITY_NAME_LEN, MAX_IDENT_LEN};
use serde::Serialize;
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

///
/// IdentError
///

#[derive(Debug, ThisError)]
pub enum IdentError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier '{ident}' length {len} exceeds max {max}")]
    TooLong {
        ident: String,
        len: usize,
        max: usize,
    },

    #[error("identifier '{ident}' must be lowercase ascii, digits, or '_'")]
    InvalidChars { ident: String },
}

///
/// EntityNameError
///

#[derive(Debug, ThisError)]
pub enum EntityNameError {
    #[error("entity name is empty")]
    Empty,

    #[error("entity name '{name}' length {len} exceeds max {max}")]
    TooLong {
        name: String,
        len: usize,
        max: usize,
    },

    #[error("entity name '{name}' must be lowercase ascii, digits, or '_'")]
    InvalidChars { name: String },
}

// Shared character rule for both identifier families.
fn is_valid_ident_str(raw: &str) -> bool {
    raw.bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

///
/// Ident
///
/// Attribute, column, and relationship identifier.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Ident(String);

impl Ident {
    pub fn try_from_str(ident: &str) -> Result<Self, IdentError> {
        let len = ident.len();

        if len == 0 {
            return Err(IdentError::Empty);
        }
        if len > MAX_IDENT_LEN {
            return Err(IdentError::TooLong {
                ident: ident.to_string(),
                len,
                max: MAX_IDENT_LEN,
            });
        }
        if !is_valid_ident_str(ident) {
            return Err(IdentError::InvalidChars {
                ident: ident.to_string(),
            });
        }

        Ok(Self(ident.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

///
/// EntityName
///
/// Stable external name of one participating record type.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct EntityName(String);

impl EntityName {
    pub fn try_from_str(name: &str) -> Result<Self, EntityNameError> {
        let len = name.len();

        if len == 0 {
            return Err(EntityNameError::Empty);
        }
        if len > MAX_ENTITY_NAME_LEN {
            return Err(EntityNameError::TooLong {
                name: name.to_string(),
                len,
                max: MAX_ENTITY_NAME_LEN,
            });
        }
        if !is_valid_ident_str(name) {
            return Err(EntityNameError::InvalidChars {
                name: name.to_string(),
            });
        }

        Ok(Self(name.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
