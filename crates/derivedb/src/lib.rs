//! ## Crate layout
//! - `core`: attribute specs, relationship descriptors, mutation hooks, the
//!   wiring pass, and the recompute dispatcher.
//!
//! The `prelude` module mirrors the surface used by host applications:
//! declare computed attributes and providers, `finalize` against the
//! reflection collaborator, then drive the lifecycle fires after each
//! mutation.

pub use derivedb_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        engine::{Engine, EntityReport, WiringReport},
        error::{BuildError, ConfigError, InternalError},
        hook::HookStage,
        ident::{EntityName, Ident},
        model::attribute::AttributeDecl,
        obs::{TraceEvent, TraceSink},
        record::{Key, Record, RecordId},
        recompute::{RecomputeOptions, Selector},
        reflect::{RelationKind, Relationship},
        traits::{Datasource, ProviderFn, Reflection},
        value::Value,
    };
}
