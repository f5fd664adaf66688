//! Observability: wiring and recompute trace events.
//!
//! Tracing is optional, injected by the caller, and must not affect engine
//! semantics. Events are owned values; sinks decide what to keep.

use crate::{
    hook::HookStage,
    ident::{EntityName, Ident},
    record::RecordId,
    value::Value,
};

///
/// WireKind
///
/// Which wiring path produced a registration.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum WireKind {
    CreateAll,
    DirectAttribute,
    ManyToMany,
    Owned,
    OwnedPolymorphic,
    Owning,
    PersistOnSave,
    PolymorphicHost,
    Through,
}

///
/// SkipReason
///
/// Why a fired observer recomputed nothing. Navigation misses are expected
/// outcomes of far-side deletions and partial object graphs, not errors.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum SkipReason {
    DestroyedHost,
    HopMissing,
    HostMissing,
    UnknownAttribute,
}

///
/// TraceEvent
///

#[derive(Clone, Debug, PartialEq)]
pub enum TraceEvent {
    /// A lifecycle stage was dispatched for one record type.
    HookFired { entity: EntityName, stage: HookStage },
    /// An entity's wiring pass started.
    ModelSetup { entity: EntityName },
    /// One attribute value was recomputed and persisted.
    Recomputed {
        id: RecordId,
        attribute: Ident,
        value: Value,
    },
    /// One observer was registered during wiring.
    Registered {
        kind: WireKind,
        /// Entity owning the computed attribute.
        entity: EntityName,
        /// Entity whose mutation lifecycle the observer watches.
        observed: EntityName,
        attribute: Option<Ident>,
    },
    /// A fired observer found nothing to recompute.
    Skipped {
        reason: SkipReason,
        entity: EntityName,
        attribute: Option<Ident>,
    },
}

///
/// TraceSink
///

pub trait TraceSink {
    fn record(&self, event: TraceEvent);
}

///
/// NullSink
/// Default sink; drops every event.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn record(&self, _: TraceEvent) {}
}
