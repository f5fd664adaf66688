//! Many-to-many wiring: join-table edges with a pre-destroy snapshot.
//!
//! Once the join rows are gone, the destroyed side navigates to nothing;
//! the pre-destroy snapshot preserves "who used to be linked" so the right
//! hosts are invalidated. The snapshot mechanism is specified behavior.

use crate::{
    engine::Engine,
    error::ConfigError,
    hook::{HookContext, HookStage, Observer},
    ident::EntityName,
    model::attribute::AttributeSpec,
    obs::{SkipReason, TraceEvent, WireKind},
    recompute::{RecomputeOptions, Selector},
    reflect::Relationship,
    wire::owning,
};

pub(super) fn wire(
    engine: &mut Engine,
    host: &EntityName,
    spec: &AttributeSpec,
    relationship: &Relationship,
) -> Result<(), ConfigError> {
    let target = relationship.require_target(host)?.clone();
    let inverse = relationship.require_inverse(host)?.clone();

    // Pre-destroy: capture the linked host set while the join rows exist.
    {
        let inverse = inverse.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
            let hosts = ctx.store.related(ctx.event.record, &inverse);
            ctx.engine
                .snapshot_hosts(&ctx.event.record.id, &inverse, hosts);
            Ok(())
        });

        engine.register_hook(
            WireKind::ManyToMany,
            host.clone(),
            target.clone(),
            Some(spec.name.clone()),
            HookStage::BeforeDestroy,
            observer,
        );
    }

    // Post-commit: prefer the live set; a destroyed opposite falls back to
    // the consumed snapshot.
    {
        let attribute = spec.name.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
            let live = ctx.store.related(ctx.event.record, &inverse);
            let hosts = if live.is_empty() {
                ctx.engine
                    .take_host_snapshot(&ctx.event.record.id, &inverse)
                    .unwrap_or_default()
            } else {
                live
            };

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
            WireKind::ManyToMany,
            host.clone(),
            target,
            Some(spec.name.clone()),
            HookStage::AfterCommit,
            observer,
        );
    }

    if let Some(marker) = &relationship.polymorphic {
        owning::wire_polymorphic_host(engine, host, &relationship.name, marker);
    }

    Ok(())
}
