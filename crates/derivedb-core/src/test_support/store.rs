//! In-memory record store for tests.
//!
//! Implements both collaborator boundaries: `Reflection` over a declared
//! catalog, and `Datasource` with foreign-key navigation (plain columns,
//! polymorphic `<marker>_type`/`<marker>_id` pairs, and a join-pair set for
//! many-to-many edges). Drives the engine's lifecycle fires the way a real
//! persistence layer would.

use crate::{
    engine::Engine,
    error::InternalError,
    ident::{EntityName, Ident},
    record::{Key, Record, RecordId},
    reflect::{RelationKind, Relationship},
    test_support::{entity, ident},
    traits::{Datasource, Reflection},
    value::Value,
};
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
};

type Row = BTreeMap<Ident, Value>;

pub(crate) struct MemoryStore {
    tables: RefCell<BTreeMap<EntityName, BTreeMap<Key, Row>>>,
    /// Canonically ordered join pairs (lower record id first).
    links: RefCell<BTreeSet<(RecordId, RecordId)>>,
    catalog: BTreeMap<EntityName, Vec<Relationship>>,
    columns: BTreeMap<EntityName, BTreeSet<Ident>>,
    next_key: Cell<u64>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            tables: RefCell::new(BTreeMap::new()),
            links: RefCell::new(BTreeSet::new()),
            catalog: BTreeMap::new(),
            columns: BTreeMap::new(),
            next_key: Cell::new(1),
        }
    }

    /// Declare one entity: its columns and relationship descriptors.
    pub(crate) fn define(&mut self, name: &str, columns: &[&str], relationships: Vec<Relationship>) {
        let name = entity(name);
        self.tables.borrow_mut().entry(name.clone()).or_default();
        self.columns
            .insert(name.clone(), columns.iter().map(|c| ident(c)).collect());
        self.catalog.insert(name, relationships);
    }

    fn load(&self, id: &RecordId) -> Option<Record> {
        self.tables
            .borrow()
            .get(&id.entity)
            .and_then(|table| table.get(&id.key))
            .map(|row| Record::new(id.clone(), row.clone()))
    }

    fn descriptor(&self, entity: &EntityName, name: &Ident) -> Option<&Relationship> {
        self.catalog
            .get(entity)
            .and_then(|rels| rels.iter().find(|r| &r.name == name))
    }

    fn fk_key(record: &Record, column: &Ident) -> Option<Key> {
        record.field(column).and_then(Value::as_uint).map(Key)
    }

    // Scan `target` rows whose `column` equals `key`.
    fn scan_by_fk(&self, target: &EntityName, column: &Ident, key: Key) -> Vec<Record> {
        let tables = self.tables.borrow();
        let Some(table) = tables.get(target) else {
            return Vec::new();
        };

        table
            .iter()
            .filter(|(_, row)| row.get(column).and_then(Value::as_uint) == Some(key.0))
            .map(|(k, row)| Record::new(RecordId::new(target.clone(), *k), row.clone()))
            .collect()
    }

    // Scan `target` rows whose marker columns point at `record`.
    fn scan_by_marker(&self, target: &EntityName, marker: &Ident, record: &Record) -> Vec<Record> {
        let type_col = ident(&format!("{marker}_type"));
        let id_col = ident(&format!("{marker}_id"));

        let tables = self.tables.borrow();
        let Some(table) = tables.get(target) else {
            return Vec::new();
        };

        table
            .iter()
            .filter(|(_, row)| {
                row.get(&type_col).and_then(Value::as_text) == Some(record.entity().as_str())
                    && row.get(&id_col).and_then(Value::as_uint) == Some(record.key().0)
            })
            .map(|(k, row)| Record::new(RecordId::new(target.clone(), *k), row.clone()))
            .collect()
    }

    fn join_partners(&self, id: &RecordId, target: &EntityName) -> Vec<Record> {
        let partners: Vec<RecordId> = self
            .links
            .borrow()
            .iter()
            .filter_map(|(a, b)| {
                if a == id {
                    Some(b.clone())
                } else if b == id {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .filter(|partner| &partner.entity == target)
            .collect();

        partners.iter().filter_map(|p| self.load(p)).collect()
    }

    // BTreeSet needs one ordering for an unordered pair.
    fn canonical_pair(a: RecordId, b: RecordId) -> (RecordId, RecordId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    // ------------------------------------------------------------------
    // mutation drivers: each one mirrors a persistence layer's lifecycle
    // ------------------------------------------------------------------

    /// Insert a row, then fire create -> save -> commit.
    pub(crate) fn create(
        &self,
        engine: &Engine,
        name: &str,
        fields: &[(&str, Value)],
    ) -> Result<Record, InternalError> {
        let name = entity(name);
        let key = Key(self.next_key.get());
        self.next_key.set(key.0 + 1);
        let id = RecordId::new(name, key);

        {
            let mut tables = self.tables.borrow_mut();
            let row: Row = fields
                .iter()
                .map(|(column, value)| (ident(column), value.clone()))
                .collect();
            tables.entry(id.entity.clone()).or_default().insert(key, row);
        }

        let changed: BTreeSet<Ident> = fields.iter().map(|(column, _)| ident(column)).collect();

        let record = self.load(&id).expect("created row should load");
        engine.after_create(self, &record)?;

        let record = self.load(&id).expect("created row should load");
        engine.after_save(self, &record, &changed)?;

        let record = self.load(&id).expect("created row should load");
        engine.after_commit(self, &record)?;

        Ok(self.load(&id).expect("created row should load"))
    }

    /// Write columns through the save lifecycle, then fire save -> commit.
    pub(crate) fn update(
        &self,
        engine: &Engine,
        id: &RecordId,
        fields: &[(&str, Value)],
    ) -> Result<Record, InternalError> {
        let mut changed = BTreeSet::new();
        {
            let mut tables = self.tables.borrow_mut();
            let row = tables
                .get_mut(&id.entity)
                .and_then(|table| table.get_mut(&id.key))
                .expect("updated row should exist");

            for (column, value) in fields {
                let column = ident(column);
                if row.get(&column) != Some(value) {
                    changed.insert(column.clone());
                }
                row.insert(column, value.clone());
            }
        }

        let record = self.load(id).expect("updated row should load");
        engine.after_save(self, &record, &changed)?;

        let record = self.load(id).expect("updated row should load");
        engine.after_commit(self, &record)?;

        Ok(self.load(id).expect("updated row should load"))
    }

    /// Remove a row (and its join pairs), firing the destroy lifecycle
    /// around the removal.
    pub(crate) fn destroy(&self, engine: &Engine, id: &RecordId) -> Result<(), InternalError> {
        let record = self.load(id).expect("destroyed row should exist");
        engine.before_destroy(self, &record)?;

        {
            let mut tables = self.tables.borrow_mut();
            if let Some(table) = tables.get_mut(&id.entity) {
                table.remove(&id.key);
            }
        }
        self.links
            .borrow_mut()
            .retain(|(a, b)| a != id && b != id);

        // The in-memory snapshot is all that is left of the record.
        engine.after_destroy(self, &record)?;
        engine.after_commit(self, &record)?;

        Ok(())
    }

    /// Add one join pair; surfaces as a commit on both sides.
    pub(crate) fn link(
        &self,
        engine: &Engine,
        a: &RecordId,
        b: &RecordId,
    ) -> Result<(), InternalError> {
        self.links
            .borrow_mut()
            .insert(Self::canonical_pair(a.clone(), b.clone()));

        let left = self.load(a).expect("linked row should exist");
        let right = self.load(b).expect("linked row should exist");
        engine.after_commit(self, &left)?;
        engine.after_commit(self, &right)?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // assertion helpers
    // ------------------------------------------------------------------

    pub(crate) fn get(&self, id: &RecordId) -> Option<Record> {
        self.load(id)
    }

    /// Stored column value, `Null` when absent or the row is gone.
    pub(crate) fn field_value(&self, id: &RecordId, column: &str) -> Value {
        self.load(id)
            .and_then(|record| record.field(&ident(column)).cloned())
            .unwrap_or(Value::Null)
    }
}

impl Reflection for MemoryStore {
    fn relationships(&self, entity: &EntityName) -> Vec<Relationship> {
        self.catalog.get(entity).cloned().unwrap_or_default()
    }

    fn attribute_names(&self, entity: &EntityName) -> BTreeSet<Ident> {
        self.columns.get(entity).cloned().unwrap_or_default()
    }
}

impl Datasource for MemoryStore {
    fn reload(&self, id: &RecordId) -> Option<Record> {
        self.load(id)
    }

    fn write_columns(&self, id: &RecordId, patch: &[(Ident, Value)]) -> Result<(), InternalError> {
        let mut tables = self.tables.borrow_mut();
        let row = tables
            .get_mut(&id.entity)
            .and_then(|table| table.get_mut(&id.key))
            .ok_or_else(|| InternalError::store_not_found(id))?;

        for (column, value) in patch {
            row.insert(column.clone(), value.clone());
        }
        Ok(())
    }

    fn is_destroyed(&self, id: &RecordId) -> bool {
        self.load(id).is_none()
    }

    fn related(&self, record: &Record, relationship: &Ident) -> Vec<Record> {
        let Some(rel) = self.descriptor(record.entity(), relationship) else {
            return Vec::new();
        };

        match rel.kind {
            RelationKind::OwnedSingular => {
                if let Some(marker) = &rel.polymorphic {
                    // Polymorphic reference: the record snapshot names the
                    // opposite type per row.
                    let type_col = ident(&format!("{marker}_type"));
                    let id_col = ident(&format!("{marker}_id"));
                    let target = record.field(&type_col).and_then(Value::as_text).map(entity);
                    let key = Self::fk_key(record, &id_col);

                    match (target, key) {
                        (Some(target), Some(key)) => self
                            .load(&RecordId::new(target, key))
                            .into_iter()
                            .collect(),
                        _ => Vec::new(),
                    }
                } else {
                    let Some(target) = rel.target.clone() else {
                        return Vec::new();
                    };
                    let fk = ident(&format!("{}_id", rel.name));

                    Self::fk_key(record, &fk)
                        .and_then(|key| self.load(&RecordId::new(target, key)))
                        .into_iter()
                        .collect()
                }
            }

            RelationKind::OwningSingular | RelationKind::OwningCollection => {
                let Some(target) = rel.target.clone() else {
                    return Vec::new();
                };

                if let Some(marker) = &rel.polymorphic {
                    self.scan_by_marker(&target, marker, record)
                } else {
                    let Some(inverse) = rel.inverse.clone() else {
                        return Vec::new();
                    };
                    let fk = ident(&format!("{inverse}_id"));
                    self.scan_by_fk(&target, &fk, record.key())
                }
            }

            RelationKind::ManyToMany => {
                let Some(target) = rel.target.clone() else {
                    return Vec::new();
                };
                self.join_partners(&record.id, &target)
            }

            RelationKind::Transitive => {
                let Some(through) = rel.through.as_deref() else {
                    return Vec::new();
                };
                let target = rel.target.clone();

                self.related(record, &through.name)
                    .into_iter()
                    .flat_map(|child| {
                        let hop = self
                            .catalog
                            .get(child.entity())
                            .and_then(|rels| {
                                rels.iter().find(|r| r.target == target && r.through.is_none())
                            })
                            .map(|r| r.name.clone());

                        match hop {
                            Some(hop) => self.related(&child, &hop),
                            None => Vec::new(),
                        }
                    })
                    .collect()
            }
        }
    }
}
