//! Owned-singular ("belongs to") wiring: the host points at the opposite
//! record, so the opposite's lifecycle drives the host's recomputation.

use crate::{
    engine::Engine,
    error::{ConfigError, InternalError},
    hook::{HookContext, HookStage, Observer},
    ident::{EntityName, Ident},
    model::attribute::AttributeSpec,
    obs::{SkipReason, TraceEvent, WireKind},
    record::Record,
    recompute::{RecomputeOptions, Selector},
    reflect::Relationship,
};

pub(super) fn wire(
    engine: &mut Engine,
    host: &EntityName,
    spec: &AttributeSpec,
    relationship: &Relationship,
) -> Result<(), ConfigError> {
    if relationship.is_polymorphic() {
        // The opposite type is unknown until runtime; the host record itself
        // carries the changing foreign reference, so watch the host instead.
        for stage in [HookStage::AfterSave, HookStage::AfterDestroy] {
            let attribute = spec.name.clone();

            let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
                let Some(fresh) = ctx.store.reload(&ctx.event.record.id) else {
                    ctx.engine.trace(TraceEvent::Skipped {
                        reason: SkipReason::DestroyedHost,
                        entity: ctx.event.record.entity().clone(),
                        attribute: Some(attribute.clone()),
                    });
                    return Ok(());
                };

                ctx.engine.recompute(
                    ctx.store,
                    &fresh,
                    &Selector::one(attribute.clone()),
                    &RecomputeOptions::default(),
                )
            });

            engine.register_hook(
                WireKind::OwnedPolymorphic,
                host.clone(),
                host.clone(),
                Some(spec.name.clone()),
                stage,
                observer,
            );
        }

        return Ok(());
    }

    let target = relationship.require_target(host)?.clone();
    let inverse = relationship.require_inverse(host)?.clone();

    // Saved opposite: reload first, so navigation sees the freshest linkage.
    {
        let inverse = inverse.clone();
        let attribute = spec.name.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
            let Some(opposite) = ctx.store.reload(&ctx.event.record.id) else {
                ctx.engine.trace(TraceEvent::Skipped {
                    reason: SkipReason::HostMissing,
                    entity: ctx.event.record.entity().clone(),
                    attribute: Some(attribute.clone()),
                });
                return Ok(());
            };

            recompute_hosts(ctx, &opposite, &inverse, &attribute)
        });

        engine.register_hook(
            WireKind::Owned,
            host.clone(),
            target.clone(),
            Some(spec.name.clone()),
            HookStage::AfterSave,
            observer,
        );
    }

    // Destroyed opposite: navigate the in-memory record; a reload after
    // destruction would find nothing.
    {
        let attribute = spec.name.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
            recompute_hosts(ctx, ctx.event.record, &inverse, &attribute)
        });

        engine.register_hook(
            WireKind::Owned,
            host.clone(),
            target,
            Some(spec.name.clone()),
            HookStage::AfterDestroy,
            observer,
        );
    }

    Ok(())
}

// Resolve the host set behind `inverse` and recompute each host against a
// fresh copy. An empty host set is an expected outcome, not an error.
fn recompute_hosts(
    ctx: &HookContext<'_>,
    opposite: &Record,
    inverse: &Ident,
    attribute: &Ident,
) -> Result<(), InternalError> {
    let hosts = ctx.store.related(opposite, inverse);
    if hosts.is_empty() {
        ctx.engine.trace(TraceEvent::Skipped {
            reason: SkipReason::HostMissing,
            entity: opposite.entity().clone(),
            attribute: Some(attribute.clone()),
        });
        return Ok(());
    }

    for host in hosts {
        let Some(fresh) = ctx.store.reload(&host.id) else {
            ctx.engine.trace(TraceEvent::Skipped {
                reason: SkipReason::DestroyedHost,
                entity: host.entity().clone(),
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
}
