//! Core runtime for DerivedDB: attribute specs, relationship descriptors,
//! mutation hooks, the wiring pass, and the recompute dispatcher exported
//! via the `prelude`.

pub mod engine;
pub mod error;
pub mod hook;
pub mod ident;
pub mod model;
pub mod obs;
pub mod record;
pub mod recompute;
pub mod reflect;
pub mod traits;
pub mod value;
pub mod wire;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum length for entity identifiers.
pub const MAX_ENTITY_NAME_LEN: usize = 64;

/// Maximum length for attribute, column, and relationship identifiers.
pub const MAX_IDENT_LEN: usize = 64;

/// Reserved selector word; never a valid attribute name.
pub const RESERVED_ALL: &str = "all";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, observers, stores, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        engine::Engine,
        hook::HookStage,
        ident::{EntityName, Ident},
        model::attribute::AttributeDecl,
        record::{Key, Record, RecordId},
        recompute::{RecomputeOptions, Selector},
        reflect::{RelationKind, Relationship},
        traits::{Datasource, Reflection},
        value::Value,
    };
}
