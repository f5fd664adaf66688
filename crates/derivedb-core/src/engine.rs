//! The engine: declaration surface, the finalize boundary, and the runtime
//! fire/recompute surfaces.
//!
//! The engine value is owned by the application's composition code. All
//! declaration happens under `&mut` before `finalize`; every runtime
//! surface takes `&self`. There is no ambient global state.

use crate::{
    error::{BuildError, ConfigError, InternalError},
    hook::{HookBus, HookContext, HookStage, MutationEvent, Observer},
    ident::{EntityName, Ident},
    model::{
        attribute::{AttributeDecl, AttributeSpec},
        registry::ModelRegistry,
    },
    obs::{TraceEvent, TraceSink, WireKind},
    record::{Record, RecordId},
    recompute::{self, RecomputeOptions, Selector},
    traits::{Datasource, ProviderFn, Reflection},
    value::Value,
    wire,
};
use serde::Serialize;
use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};

///
/// Engine
///
/// Process-wide registry of computed attributes, their wiring, and the
/// runtime dispatch surfaces.
///

pub struct Engine {
    pub(crate) models: BTreeMap<EntityName, ModelRegistry>,
    pub(crate) providers: BTreeMap<(EntityName, String), ProviderFn>,
    pub(crate) hooks: HookBus,
    /// Pre-destroy host snapshots for many-to-many edges, keyed by
    /// (destroyed opposite record, inverse name). One mutation event's
    /// lifetime: written pre-destroy, consumed post-commit.
    snapshots: RefCell<BTreeMap<(RecordId, Ident), Vec<Record>>>,
    sink: Option<Box<dyn TraceSink>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
            providers: BTreeMap::new(),
            hooks: HookBus::new(),
            snapshots: RefCell::new(BTreeMap::new()),
            sink: None,
        }
    }

    /// Install a trace sink. Tracing must not affect engine semantics.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    /// Declare one computed attribute on an entity. Redeclaring with
    /// identical options is a no-op; conflicting options fail here.
    pub fn declare(&mut self, entity: &str, decl: AttributeDecl) -> Result<(), ConfigError> {
        let entity = EntityName::try_from_str(entity)?;
        let model = self
            .models
            .entry(entity.clone())
            .or_insert_with(|| ModelRegistry::new(entity));
        model.declare(&decl)
    }

    /// Register a computed-value provider under its conventional name
    /// (`computed_<attribute>`).
    pub fn register_provider(
        &mut self,
        entity: &str,
        provider: &str,
        f: ProviderFn,
    ) -> Result<(), ConfigError> {
        let entity = EntityName::try_from_str(entity)?;
        let key = (entity, provider.to_string());
        if self.providers.contains_key(&key) {
            return Err(ConfigError::DuplicateProvider {
                entity: key.0,
                provider: key.1,
            });
        }

        self.providers.insert(key, f);
        Ok(())
    }

    /// One-time wiring pass over every declared entity. Call once after all
    /// declarations are in; calling again later wires only entities declared
    /// since (wired entities are skipped). Every configuration error below
    /// is fatal here, never at mutation time.
    pub fn finalize(&mut self, reflection: &dyn Reflection) -> Result<(), BuildError> {
        wire::wire_all(self, reflection)
    }

    // ------------------------------------------------------------------
    // runtime: lifecycle fires, driven by the host after each mutation
    // ------------------------------------------------------------------

    pub fn after_create(
        &self,
        store: &dyn Datasource,
        record: &Record,
    ) -> Result<(), InternalError> {
        self.fire(store, record, &BTreeSet::new(), HookStage::AfterCreate)
    }

    /// `changed` is the set of columns the save actually wrote; the
    /// direct-attribute guard reads it.
    pub fn after_save(
        &self,
        store: &dyn Datasource,
        record: &Record,
        changed: &BTreeSet<Ident>,
    ) -> Result<(), InternalError> {
        self.fire(store, record, changed, HookStage::AfterSave)
    }

    pub fn before_destroy(
        &self,
        store: &dyn Datasource,
        record: &Record,
    ) -> Result<(), InternalError> {
        self.fire(store, record, &BTreeSet::new(), HookStage::BeforeDestroy)
    }

    pub fn after_destroy(
        &self,
        store: &dyn Datasource,
        record: &Record,
    ) -> Result<(), InternalError> {
        self.fire(store, record, &BTreeSet::new(), HookStage::AfterDestroy)
    }

    pub fn after_commit(
        &self,
        store: &dyn Datasource,
        record: &Record,
    ) -> Result<(), InternalError> {
        self.fire(store, record, &BTreeSet::new(), HookStage::AfterCommit)
    }

    fn fire(
        &self,
        store: &dyn Datasource,
        record: &Record,
        changed: &BTreeSet<Ident>,
        stage: HookStage,
    ) -> Result<(), InternalError> {
        self.trace(TraceEvent::HookFired {
            entity: record.id.entity.clone(),
            stage,
        });

        let ctx = HookContext {
            engine: self,
            store,
            event: MutationEvent { record, changed },
        };
        self.hooks.fire(&ctx, stage)
    }

    /// Recompute and persist the selected attributes of one record.
    pub fn recompute(
        &self,
        store: &dyn Datasource,
        record: &Record,
        selector: &Selector,
        options: &RecomputeOptions,
    ) -> Result<(), InternalError> {
        recompute::dispatch(self, store, record, selector, options)
    }

    // ------------------------------------------------------------------
    // lookups and internal surfaces
    // ------------------------------------------------------------------

    #[must_use]
    pub fn model(&self, entity: &EntityName) -> Option<&ModelRegistry> {
        self.models.get(entity)
    }

    pub(crate) fn has_provider(&self, entity: &EntityName, provider: &str) -> bool {
        self.providers
            .contains_key(&(entity.clone(), provider.to_string()))
    }

    pub(crate) fn invoke_provider(
        &self,
        store: &dyn Datasource,
        record: &Record,
        spec: &AttributeSpec,
    ) -> Result<Value, InternalError> {
        let key = (spec.owner.clone(), spec.provider_name());
        let Some(provider) = self.providers.get(&key) else {
            // Wiring verified presence; absence here is an engine invariant break.
            return Err(InternalError::recompute_invariant(format!(
                "provider '{}' missing for '{}'",
                key.1, key.0
            )));
        };

        provider(store, record)
    }

    pub(crate) fn register_hook(
        &mut self,
        kind: WireKind,
        host: EntityName,
        observed: EntityName,
        attribute: Option<Ident>,
        stage: HookStage,
        observer: Observer,
    ) {
        self.trace(TraceEvent::Registered {
            kind,
            entity: host,
            observed: observed.clone(),
            attribute,
        });
        self.hooks.register(observed, stage, observer);
    }

    pub(crate) fn trace(&self, event: TraceEvent) {
        if let Some(sink) = &self.sink {
            sink.record(event);
        }
    }

    /// Capture the set of hosts linked to `id` through `inverse` before the
    /// join rows disappear.
    pub(crate) fn snapshot_hosts(&self, id: &RecordId, inverse: &Ident, hosts: Vec<Record>) {
        self.snapshots
            .borrow_mut()
            .insert((id.clone(), inverse.clone()), hosts);
    }

    /// Consume the pre-destroy snapshot for one mutation event.
    pub(crate) fn take_host_snapshot(
        &self,
        id: &RecordId,
        inverse: &Ident,
    ) -> Option<Vec<Record>> {
        self.snapshots
            .borrow_mut()
            .remove(&(id.clone(), inverse.clone()))
    }

    /// Serializable wiring summary for observability surfaces.
    #[must_use]
    pub fn wiring_report(&self) -> WiringReport {
        let entities = self
            .models
            .values()
            .map(|model| EntityReport {
                entity: model.entity().clone(),
                attributes: model.attributes().len(),
                relationships: model.relationships().len(),
                observers_watching: self.hooks.watching(model.entity()),
                wired: model.is_wired(),
            })
            .collect();

        WiringReport {
            entities,
            registrations: self.hooks.len(),
        }
    }
}

///
/// WiringReport
///
/// Point-in-time wiring summary.
///

#[derive(Debug, Serialize)]
pub struct WiringReport {
    pub entities: Vec<EntityReport>,
    /// Total observer registrations across all entities and stages.
    pub registrations: usize,
}

///
/// EntityReport
///

#[derive(Debug, Serialize)]
pub struct EntityReport {
    pub entity: EntityName,
    pub attributes: usize,
    pub relationships: usize,
    /// Observers registered on this entity's own lifecycle.
    pub observers_watching: usize,
    pub wired: bool,
}
