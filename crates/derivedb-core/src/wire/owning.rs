//! Owning ("has one" / "has many") wiring: opposite records point back at
//! the host through their inverse.

use crate::{
    engine::Engine,
    error::ConfigError,
    hook::{HookContext, HookStage, Observer},
    ident::{EntityName, Ident},
    model::attribute::AttributeSpec,
    obs::{SkipReason, TraceEvent, WireKind},
    recompute::{RecomputeOptions, Selector},
    reflect::Relationship,
};

pub(super) fn wire(
    engine: &mut Engine,
    host: &EntityName,
    spec: &AttributeSpec,
    relationship: &Relationship,
) -> Result<(), ConfigError> {
    let target = relationship.require_target(host)?.clone();
    let inverse = relationship.require_inverse(host)?.clone();

    for stage in [HookStage::AfterSave, HookStage::AfterDestroy] {
        let inverse = inverse.clone();
        let attribute = spec.name.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
            // The in-memory opposite still carries its foreign key after
            // destroy; navigation needs no reload on this side.
            let hosts = ctx.store.related(ctx.event.record, &inverse);
            if hosts.is_empty() {
                ctx.engine.trace(TraceEvent::Skipped {
                    reason: SkipReason::HostMissing,
                    entity: ctx.event.record.entity().clone(),
                    attribute: Some(attribute.clone()),
                });
                return Ok(());
            }

            for host_rec in hosts {
                let Some(fresh) = ctx.store.reload(&host_rec.id) else {
                    ctx.engine.trace(TraceEvent::Skipped {
                        reason: SkipReason::DestroyedHost,
                        entity: host_rec.entity().clone(),
                        attribute: Some(attribute.clone()),
                    });
                    continue;
                };

                ctx.engine.recompute(
                    ctx.store,
                    &fresh,
                    &Selector::one(attribute.clone()),
                    &RecomputeOptions::default(),
                )?;
            }

            Ok(())
        });

        engine.register_hook(
            WireKind::Owning,
            host.clone(),
            target.clone(),
            Some(spec.name.clone()),
            stage,
            observer,
        );
    }

    if let Some(marker) = &relationship.polymorphic {
        wire_polymorphic_host(engine, host, &relationship.name, marker);
    }

    Ok(())
}

/// Host-side fan-out for a polymorphic marker: each record in the host's
/// collection recomputes only the attributes declared against the marker,
/// nothing else on it.
pub(super) fn wire_polymorphic_host(
    engine: &mut Engine,
    host: &EntityName,
    collection: &Ident,
    marker: &Ident,
) {
    for stage in [HookStage::AfterSave, HookStage::AfterDestroy] {
        let collection = collection.clone();
        let marker = marker.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
            for member in ctx.store.related(ctx.event.record, &collection) {
                ctx.engine.recompute(
                    ctx.store,
                    &member,
                    &Selector::All,
                    &RecomputeOptions::uses(marker.clone()),
                )?;
            }
            Ok(())
        });

        engine.register_hook(
            WireKind::PolymorphicHost,
            host.clone(),
            host.clone(),
            None,
            stage,
            observer,
        );
    }
}
