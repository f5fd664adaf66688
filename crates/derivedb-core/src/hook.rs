//! Mutation-event boundary: the observer table and its dispatch loop.
//!
//! The host application drives one fire per lifecycle stage after each
//! mutation. Registrations are created once during wiring and never
//! removed; fire order within one stage is registration order, which
//! wiring derives from the sorted relationship snapshot.

use crate::{
    engine::Engine,
    error::InternalError,
    ident::{EntityName, Ident},
    record::Record,
    traits::Datasource,
};
use derive_more::Display;
use std::collections::{BTreeMap, BTreeSet};

///
/// HookStage
///
/// Mutation lifecycle stages observers can attach to, in firing order.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum HookStage {
    #[display("after_create")]
    AfterCreate,
    #[display("after_save")]
    AfterSave,
    #[display("before_destroy")]
    BeforeDestroy,
    #[display("after_destroy")]
    AfterDestroy,
    #[display("after_commit")]
    AfterCommit,
}

///
/// MutationEvent
///
/// One fired mutation: the mutated record plus the set of columns the
/// triggering save actually changed (empty for create/destroy stages).
///

pub struct MutationEvent<'a> {
    pub record: &'a Record,
    pub changed: &'a BTreeSet<Ident>,
}

impl MutationEvent<'_> {
    /// Changed? guard for direct-attribute dependencies.
    #[must_use]
    pub fn is_changed(&self, column: &Ident) -> bool {
        self.changed.contains(column)
    }
}

///
/// HookContext
///
/// Everything an observer sees when it fires: the engine (for recompute and
/// snapshot access), the datasource, and the mutation event.
///

pub struct HookContext<'a> {
    pub engine: &'a Engine,
    pub store: &'a dyn Datasource,
    pub event: MutationEvent<'a>,
}

///
/// Observer
///
/// One wiring registration. Runtime navigation misses inside an observer
/// are soft no-ops; only store writes and provider failures surface here.
///

pub type Observer = Box<dyn Fn(&HookContext<'_>) -> Result<(), InternalError>>;

///
/// HookBus
///
/// Observer table keyed by (entity, stage). Write-once: populated under
/// `&mut` during wiring, read-only at runtime.
///

#[derive(Default)]
pub struct HookBus {
    observers: BTreeMap<(EntityName, HookStage), Vec<Observer>>,
}

impl HookBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, entity: EntityName, stage: HookStage, observer: Observer) {
        self.observers.entry((entity, stage)).or_default().push(observer);
    }

    /// Run every observer registered for the event's entity at `stage`,
    /// synchronously and in registration order. The first error aborts the
    /// chain and propagates to the caller of the triggering mutation.
    pub(crate) fn fire(&self, ctx: &HookContext<'_>, stage: HookStage) -> Result<(), InternalError> {
        let key = (ctx.event.record.id.entity.clone(), stage);
        let Some(observers) = self.observers.get(&key) else {
            return Ok(());
        };

        for observer in observers {
            observer(ctx)?;
        }
        Ok(())
    }

    /// Total registrations across all entities and stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Registrations watching one entity, across all stages.
    #[must_use]
    pub fn watching(&self, entity: &EntityName) -> usize {
        self.observers
            .iter()
            .filter(|((e, _), _)| e == entity)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl std::fmt::Debug for HookBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for ((entity, stage), observers) in &self.observers {
            map.entry(&format!("{entity}:{stage}"), &observers.len());
        }
        map.finish()
    }
}
