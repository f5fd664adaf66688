//! Collaborator boundaries the engine consumes.
//!
//! The engine is single-threaded and synchronous; none of these carry
//! `Send`/`Sync` bounds.

use crate::{
    error::InternalError,
    ident::{EntityName, Ident},
    record::{Record, RecordId},
    reflect::Relationship,
    value::Value,
};
use std::collections::BTreeSet;

///
/// Reflection
///
/// Wiring-time relationship and column metadata for one record type.
/// Descriptors must arrive with concrete inverse names where their kind
/// requires one; the engine rejects incomplete descriptors at wiring.
///

pub trait Reflection {
    fn relationships(&self, entity: &EntityName) -> Vec<Relationship>;
    fn attribute_names(&self, entity: &EntityName) -> BTreeSet<Ident>;
}

///
/// Datasource
///
/// Runtime persistence and navigation.
///
/// `write_columns` MUST bypass the save lifecycle: recomputation persists
/// through it precisely so the observers this engine installs do not fire
/// again.
///

pub trait Datasource {
    /// Fresh copy of one record, or `None` once the row is gone.
    fn reload(&self, id: &RecordId) -> Option<Record>;

    /// Column-level write that skips every lifecycle callback.
    fn write_columns(&self, id: &RecordId, patch: &[(Ident, Value)]) -> Result<(), InternalError>;

    fn is_destroyed(&self, id: &RecordId) -> bool;

    /// Navigate a named relationship from `record`. Navigation from a
    /// destroyed record uses the in-memory snapshot for owned references.
    fn related(&self, record: &Record, relationship: &Ident) -> Vec<Record>;
}

///
/// ProviderFn
///
/// Computed-value provider registered per (entity, conventional name).
/// Application-supplied; failures propagate to the caller of the
/// triggering mutation.
///

pub type ProviderFn = Box<dyn Fn(&dyn Datasource, &Record) -> Result<Value, InternalError>>;
