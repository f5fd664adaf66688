//! Direct-attribute and persist-on-save wiring: observers on the host
//! type itself.

use crate::{
    engine::Engine,
    hook::{HookContext, HookStage, Observer},
    ident::Ident,
    model::attribute::AttributeSpec,
    obs::WireKind,
    recompute::{RecomputeOptions, Selector},
};

/// Plain column dependency: recompute only when that column actually
/// changed in the triggering save.
pub(super) fn wire_column(engine: &mut Engine, spec: &AttributeSpec, column: &Ident) {
    let attribute = spec.name.clone();
    let column = column.clone();

    let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
        // Pure changed? guard: unrelated saves must not recompute.
        if !ctx.event.is_changed(&column) {
            return Ok(());
        }

        ctx.engine.recompute(
            ctx.store,
            ctx.event.record,
            &Selector::one(attribute.clone()),
            &RecomputeOptions::default(),
        )
    });

    engine.register_hook(
        WireKind::DirectAttribute,
        spec.owner.clone(),
        spec.owner.clone(),
        Some(spec.name.clone()),
        HookStage::AfterSave,
        observer,
    );
}

/// Persist-on-save mode: recompute on every host save, changed or not.
pub(super) fn wire_persist_on_save(engine: &mut Engine, spec: &AttributeSpec) {
    let attribute = spec.name.clone();

    let observer: Observer = Box::new(move |ctx: &HookContext<'_>| {
        ctx.engine.recompute(
            ctx.store,
            ctx.event.record,
            &Selector::one(attribute.clone()),
            &RecomputeOptions::default(),
        )
    });

    engine.register_hook(
        WireKind::PersistOnSave,
        spec.owner.clone(),
        spec.owner.clone(),
        Some(spec.name.clone()),
        HookStage::AfterSave,
        observer,
    );
}
