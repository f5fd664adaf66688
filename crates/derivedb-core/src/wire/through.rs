//! Transitive ("through") wiring: host -> child -> grandchild.
//!
//! The child hop behaves like an owning edge. The grandchild hop exists
//! because a grandchild's mutation does not notify the two-hops-removed
//! host on its own; its navigation path back to the child is resolved once
//! at wiring and never re-derived per mutation.

use crate::{
    engine::Engine,
    error::ConfigError,
    hook::{HookContext, HookStage, Observer},
    ident::EntityName,
    model::attribute::AttributeSpec,
    obs::{SkipReason, TraceEvent, WireKind},
    recompute::{RecomputeOptions, Selector},
    reflect::{RelationKind, Relationship},
    traits::Reflection,
};

pub(super) fn wire(
    engine: &mut Engine,
    reflection: &dyn Reflection,
    host: &EntityName,
    spec: &AttributeSpec,
    relationship: &Relationship,
) -> Result<(), ConfigError> {
    let grandchild = relationship.require_target(host)?.clone();
    let through = relationship.require_through(host)?;
    let child = through.require_target(host)?.clone();
    let inverse = through.require_inverse(host)?.clone();

    // Child hop: the through target notifies the host like an owning edge.
    for stage in [HookStage::AfterSave, HookStage::AfterDestroy] {
        let inverse = inverse.clone();
        let attribute = spec.name.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
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
            WireKind::Through,
            host.clone(),
            child.clone(),
            Some(spec.name.clone()),
            stage,
            observer,
        );
    }

    // Resolve the grandchild's owned-singular path back to the child once,
    // at wiring. A grandchild type with no such path is misconfigured.
    let hop = reflection
        .relationships(&grandchild)
        .into_iter()
        .find(|r| r.kind == RelationKind::OwnedSingular && r.target.as_ref() == Some(&child))
        .ok_or_else(|| ConfigError::MissingThroughHop {
            entity: host.clone(),
            relationship: relationship.name.clone(),
            grandchild: grandchild.clone(),
            child: child.clone(),
        })?;
    let hop_name = hop.name;

    // Grandchild hop: grandchild -> child -> host, every hop a soft no-op
    // when the record on the far side is gone.
    for stage in [HookStage::AfterSave, HookStage::AfterDestroy] {
        let hop_name = hop_name.clone();
        let inverse = inverse.clone();
        let attribute = spec.name.clone();

        let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
            let record = ctx.event.record;

            // Reload the grandchild unless it was just destroyed; the
            // destroyed record's snapshot still carries its foreign key.
            let grand = if ctx.store.is_destroyed(&record.id) {
                record.clone()
            } else {
                match ctx.store.reload(&record.id) {
                    Some(fresh) => fresh,
                    None => {
                        ctx.engine.trace(TraceEvent::Skipped {
                            reason: SkipReason::HopMissing,
                            entity: record.entity().clone(),
                            attribute: Some(attribute.clone()),
                        });
                        return Ok(());
                    }
                }
            };

            let Some(child_rec) = ctx.store.related(&grand, &hop_name).into_iter().next() else {
                ctx.engine.trace(TraceEvent::Skipped {
                    reason: SkipReason::HopMissing,
                    entity: grand.entity().clone(),
                    attribute: Some(attribute.clone()),
                });
                return Ok(());
            };
            let Some(child_fresh) = ctx.store.reload(&child_rec.id) else {
                ctx.engine.trace(TraceEvent::Skipped {
                    reason: SkipReason::HopMissing,
                    entity: child_rec.entity().clone(),
                    attribute: Some(attribute.clone()),
                });
                return Ok(());
            };

            let Some(host_rec) = ctx.store.related(&child_fresh, &inverse).into_iter().next()
            else {
                ctx.engine.trace(TraceEvent::Skipped {
                    reason: SkipReason::HostMissing,
                    entity: child_fresh.entity().clone(),
                    attribute: Some(attribute.clone()),
                });
                return Ok(());
            };
            let Some(host_fresh) = ctx.store.reload(&host_rec.id) else {
                ctx.engine.trace(TraceEvent::Skipped {
                    reason: SkipReason::DestroyedHost,
                    entity: host_rec.entity().clone(),
                    attribute: Some(attribute.clone()),
                });
                return Ok(());
            };

            ctx.engine.recompute(
                ctx.store,
                &host_fresh,
                &Selector::one(attribute.clone()),
                &RecomputeOptions::default(),
            )
        });

        engine.register_hook(
            WireKind::Through,
            host.clone(),
            grandchild.clone(),
            Some(spec.name.clone()),
            stage,
            observer,
        );
    }

    Ok(())
}
