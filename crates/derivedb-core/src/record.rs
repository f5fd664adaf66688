//! Record identity and in-memory column snapshots.

use crate::{
    ident::{EntityName, Ident},
    value::Value,
};
use derive_more::Display;
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

///
/// Key
///
/// Host-assigned surrogate key for one stored record.
///

#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Key(pub u64);

///
/// RecordId
///
/// Entity-qualified record identity: entity name plus key.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct RecordId {
    pub entity: EntityName,
    pub key: Key,
}

impl RecordId {
    #[must_use]
    pub const fn new(entity: EntityName, key: Key) -> Self {
        Self { entity, key }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity, self.key)
    }
}

///
/// Record
///
/// One record with its in-memory column snapshot. The snapshot is what
/// observers navigate for destroyed records, whose rows are already gone.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: BTreeMap<Ident, Value>,
}

impl Record {
    #[must_use]
    pub const fn new(id: RecordId, fields: BTreeMap<Ident, Value>) -> Self {
        Self { id, fields }
    }

    #[must_use]
    pub const fn entity(&self) -> &EntityName {
        &self.id.entity
    }

    #[must_use]
    pub const fn key(&self) -> Key {
        self.id.key
    }

    /// Column value from the in-memory snapshot, if present.
    #[must_use]
    pub fn field(&self, name: &Ident) -> Option<&Value> {
        self.fields.get(name)
    }
}
