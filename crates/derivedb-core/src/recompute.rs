//! Recompute dispatch: provider invocation plus the lifecycle-bypassing
//! column write.

use crate::{
    engine::Engine,
    error::InternalError,
    ident::Ident,
    model::attribute::AttributeSpec,
    obs::{SkipReason, TraceEvent},
    record::Record,
    traits::Datasource,
};

///
/// Selector
///
/// Which attributes to recompute: every declared spec, or a named subset.
/// Names that match no spec are dropped, not errored.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Selector {
    All,
    Only(Vec<Ident>),
}

impl Selector {
    /// Single-attribute selector.
    #[must_use]
    pub fn one(name: Ident) -> Self {
        Self::Only(vec![name])
    }
}

///
/// RecomputeOptions
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecomputeOptions {
    /// Restrict to specs matching this capability tag.
    pub uses: Option<Ident>,
}

impl RecomputeOptions {
    #[must_use]
    pub const fn uses(tag: Ident) -> Self {
        Self { uses: Some(tag) }
    }
}

/// Recompute the selected attributes of `record` and persist each result
/// via a column write that bypasses the save lifecycle.
pub(crate) fn dispatch(
    engine: &Engine,
    store: &dyn Datasource,
    record: &Record,
    selector: &Selector,
    options: &RecomputeOptions,
) -> Result<(), InternalError> {
    // An entity with no declared attributes has nothing to recompute.
    let Some(model) = engine.model(record.entity()) else {
        return Ok(());
    };

    let mut specs: Vec<&AttributeSpec> = match selector {
        Selector::All => model.attributes().iter().collect(),
        Selector::Only(names) => {
            let mut specs = Vec::with_capacity(names.len());
            for name in names {
                match model.attribute(name) {
                    Some(spec) => specs.push(spec),
                    None => engine.trace(TraceEvent::Skipped {
                        reason: SkipReason::UnknownAttribute,
                        entity: record.entity().clone(),
                        attribute: Some(name.clone()),
                    }),
                }
            }
            specs
        }
    };

    if let Some(tag) = &options.uses {
        specs.retain(|spec| spec.matches_uses(tag));
    }

    for spec in specs {
        let value = engine.invoke_provider(store, record, spec)?;
        store.write_columns(&record.id, &[(spec.name.clone(), value.clone())])?;
        engine.trace(TraceEvent::Recomputed {
            id: record.id.clone(),
            attribute: spec.name.clone(),
            value,
        });
    }

    Ok(())
}
