//! One-time wiring: translating declared dependencies into hook-bus
//! registrations.
//!
//! Staged like schema validation: every configuration error across every
//! entity is aggregated before startup is aborted. A misconfigured system
//! fails here, never on first mutation.

mod attribute;
mod many_to_many;
mod owned;
mod owning;
mod through;


use crate::{
    engine::Engine,
    error::{BuildError, ConfigError, ErrorTree},
    hook::{HookContext, HookStage, Observer},
    ident::{EntityName, Ident},
    model::attribute::AttributeSpec,
    obs::{TraceEvent, WireKind},
    recompute::{RecomputeOptions, Selector},
    reflect::{RelationKind, Relationship},
    traits::Reflection,
};

/// Wire every declared entity that is not wired yet.
pub(crate) fn wire_all(
    engine: &mut Engine,
    reflection: &dyn Reflection,
) -> Result<(), BuildError> {
    let mut errs = ErrorTree::new();
    let entities: Vec<EntityName> = engine.models.keys().cloned().collect();

    for entity in entities {
        let skip = match engine.models.get(&entity) {
            Some(model) => model.is_wired() || model.attributes().is_empty(),
            None => true,
        };
        if skip {
            continue;
        }

        // Snapshot the entity's relationships once; descriptors declared
        // after this point are not seen.
        let relationships = reflection.relationships(&entity);
        if let Some(model) = engine.models.get_mut(&entity) {
            model.snapshot_relationships(relationships);
        }

        let before = errs.len();
        wire_model(engine, reflection, &entity, &mut errs);

        if errs.len() == before
            && let Some(model) = engine.models.get_mut(&entity)
        {
            model.mark_wired();
        }
    }

    errs.result().map_err(BuildError::Validation)
}

// Wire one entity: creation pass plus per-spec dependency resolution.
fn wire_model(
    engine: &mut Engine,
    reflection: &dyn Reflection,
    entity: &EntityName,
    errs: &mut ErrorTree,
) {
    engine.trace(TraceEvent::ModelSetup {
        entity: entity.clone(),
    });

    // Every new record of this entity recomputes all declared attributes.
    register_create_all(engine, entity);

    let specs = match engine.models.get(entity) {
        Some(model) => model.attributes().to_vec(),
        None => return,
    };
    let columns = reflection.attribute_names(entity);

    for spec in &specs {
        // Provider presence is checked before any dependency resolves.
        let provider = spec.provider_name();
        if !engine.has_provider(entity, &provider) {
            errs.add(
                route(entity, &spec.name),
                ConfigError::MissingProvider {
                    entity: entity.clone(),
                    attribute: spec.name.clone(),
                    provider,
                },
            );
            continue;
        }

        if spec.persist_on_save {
            attribute::wire_persist_on_save(engine, spec);
        }

        for dep in &spec.dependencies {
            let relationship = engine
                .models
                .get(entity)
                .and_then(|model| model.relationship(dep))
                .cloned();

            match relationship {
                Some(relationship) => {
                    if let Err(err) = wire_relationship(engine, reflection, entity, spec, &relationship)
                    {
                        errs.add(route(entity, &spec.name), err);
                    }
                }
                None if columns.contains(dep) => attribute::wire_column(engine, spec, dep),
                None => errs.add(
                    route(entity, &spec.name),
                    ConfigError::UnknownDependency {
                        entity: entity.clone(),
                        attribute: spec.name.clone(),
                        dependency: dep.clone(),
                    },
                ),
            }
        }
    }
}

// Dispatch to exactly one strategy per relationship kind. The enum is
// closed: a new kind fails to compile until it is handled here.
fn wire_relationship(
    engine: &mut Engine,
    reflection: &dyn Reflection,
    host: &EntityName,
    spec: &AttributeSpec,
    relationship: &Relationship,
) -> Result<(), ConfigError> {
    match relationship.kind {
        RelationKind::ManyToMany => many_to_many::wire(engine, host, spec, relationship),
        RelationKind::OwnedSingular => owned::wire(engine, host, spec, relationship),
        RelationKind::OwningCollection | RelationKind::OwningSingular => {
            owning::wire(engine, host, spec, relationship)
        }
        RelationKind::Transitive => through::wire(engine, reflection, host, spec, relationship),
    }
}

fn register_create_all(engine: &mut Engine, entity: &EntityName) {
    let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
        ctx.engine.recompute(
            ctx.store,
            ctx.event.record,
            &Selector::All,
            &RecomputeOptions::default(),
        )
    });

    engine.register_hook(
        WireKind::CreateAll,
        entity.clone(),
        entity.clone(),
        None,
        HookStage::AfterCreate,
        observer,
    );
}

fn route(entity: &EntityName, attribute: &Ident) -> String {
    format!("{entity}.{attribute}")
}
