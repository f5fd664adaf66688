//! The astronomy fixture catalog: galaxies own solar systems, systems own
//! one star, stars own planets, planets neighbor each other through a join
//! and emit polymorphic gravitational fields, moons point back at planets.

use crate::{
    engine::Engine,
    model::attribute::AttributeDecl,
    obs::{TraceEvent, TraceSink},
    record::Record,
    reflect::Relationship,
    test_support::{RecordingSink, entity, ident, store::MemoryStore},
    traits::Datasource,
    value::Value,
};
use std::{cell::RefCell, rc::Rc};

///
/// Cosmos
///
/// One wired engine over the astronomy catalog.
///

pub(crate) struct Cosmos {
    pub(crate) store: MemoryStore,
    pub(crate) engine: Engine,
}

pub(crate) fn cosmos() -> Cosmos {
    build_cosmos(None)
}

pub(crate) fn cosmos_with_sink() -> (Cosmos, Rc<RefCell<Vec<TraceEvent>>>) {
    let (sink, events) = RecordingSink::new();
    (build_cosmos(Some(Box::new(sink))), events)
}

fn build_cosmos(sink: Option<Box<dyn TraceSink>>) -> Cosmos {
    let store = astronomy_store();
    let mut engine = astronomy_engine();
    if let Some(sink) = sink {
        engine.set_trace_sink(sink);
    }
    engine
        .finalize(&store)
        .expect("astronomy wiring should succeed");

    Cosmos { store, engine }
}

pub(crate) fn astronomy_store() -> MemoryStore {
    let mut store = MemoryStore::new();

    store.define(
        "galaxy",
        &["system_count", "star_count"],
        vec![
            Relationship::owning_many(
                ident("solar_systems"),
                entity("solar_system"),
                ident("galaxy"),
            ),
            Relationship::transitive(
                ident("stars"),
                entity("star"),
                Relationship::owning_many(
                    ident("solar_systems"),
                    entity("solar_system"),
                    ident("galaxy"),
                ),
            ),
        ],
    );

    store.define(
        "solar_system",
        &["galaxy_id"],
        vec![
            Relationship::owned(ident("galaxy"), entity("galaxy"), ident("solar_systems")),
            Relationship::owning_one(ident("star"), entity("star"), ident("solar_system")),
        ],
    );

    store.define(
        "star",
        &["solar_system_id", "classification"],
        vec![
            Relationship::owned(ident("solar_system"), entity("solar_system"), ident("star")),
            Relationship::owning_many(ident("planets"), entity("planet"), ident("star")),
        ],
    );

    store.define(
        "planet",
        &[
            "star_id",
            "name",
            "radius",
            "circumference",
            "diameter",
            "gravitational_field_radius_sum",
            "neighbor_count",
        ],
        vec![
            Relationship::owned(ident("star"), entity("star"), ident("planets")),
            Relationship::many_to_many(ident("neighbors"), entity("neighbor"), ident("planets")),
            Relationship::owning_many(
                ident("gravitational_fields"),
                entity("gravitational_field"),
                ident("owner"),
            )
            .with_marker(ident("owner")),
            Relationship::owning_many(ident("moons"), entity("moon"), ident("planet")),
        ],
    );

    store.define(
        "neighbor",
        &["name"],
        vec![Relationship::many_to_many(
            ident("planets"),
            entity("planet"),
            ident("neighbors"),
        )],
    );

    store.define(
        "moon",
        &["planet_id", "planet_name"],
        vec![Relationship::owned(
            ident("planet"),
            entity("planet"),
            ident("moons"),
        )],
    );

    store.define(
        "gravitational_field",
        &[
            "owner_type",
            "owner_id",
            "radius",
            "radius_doubled",
            "emanates_from_planet",
        ],
        vec![Relationship::owned_polymorphic(ident("owner"), ident("owner"))],
    );

    store
}

pub(crate) fn astronomy_engine() -> Engine {
    let mut engine = Engine::new();

    engine
        .declare(
            "galaxy",
            AttributeDecl::new("system_count").depends(["solar_systems"]),
        )
        .expect("galaxy.system_count should declare");
    engine
        .declare("galaxy", AttributeDecl::new("star_count").depends(["stars"]))
        .expect("galaxy.star_count should declare");

    engine
        .declare("planet", AttributeDecl::new("circumference").persist_on_save())
        .expect("planet.circumference should declare");
    engine
        .declare("planet", AttributeDecl::new("diameter").depends(["radius"]))
        .expect("planet.diameter should declare");
    engine
        .declare(
            "planet",
            AttributeDecl::new("gravitational_field_radius_sum").depends(["gravitational_fields"]),
        )
        .expect("planet.gravitational_field_radius_sum should declare");
    engine
        .declare(
            "planet",
            AttributeDecl::new("neighbor_count").depends(["neighbors"]),
        )
        .expect("planet.neighbor_count should declare");

    engine
        .declare("moon", AttributeDecl::new("planet_name").depends(["planet"]))
        .expect("moon.planet_name should declare");

    engine
        .declare(
            "gravitational_field",
            AttributeDecl::new("emanates_from_planet").depends(["owner"]),
        )
        .expect("gravitational_field.emanates_from_planet should declare");
    engine
        .declare(
            "gravitational_field",
            AttributeDecl::new("radius_doubled").depends(["radius"]),
        )
        .expect("gravitational_field.radius_doubled should declare");

    register_astronomy_providers(&mut engine);

    engine
}

fn register_astronomy_providers(engine: &mut Engine) {
    engine
        .register_provider(
            "galaxy",
            "computed_system_count",
            Box::new(|db: &dyn Datasource, rec: &Record| Ok(count_related(db, rec, "solar_systems"))),
        )
        .expect("computed_system_count should register");

    engine
        .register_provider(
            "galaxy",
            "computed_star_count",
            Box::new(|db: &dyn Datasource, rec: &Record| Ok(count_related(db, rec, "stars"))),
        )
        .expect("computed_star_count should register");

    engine
        .register_provider(
            "planet",
            "computed_circumference",
            Box::new(|_: &dyn Datasource, rec: &Record| {
                let radius = uint_field(rec, "radius");
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_precision_loss,
                    clippy::cast_sign_loss
                )]
                let circumference = ((radius as f64) * 2.0 * std::f64::consts::PI).trunc() as u64;
                Ok(Value::Uint(circumference))
            }),
        )
        .expect("computed_circumference should register");

    engine
        .register_provider(
            "planet",
            "computed_diameter",
            Box::new(|_: &dyn Datasource, rec: &Record| Ok(Value::Uint(uint_field(rec, "radius") * 2))),
        )
        .expect("computed_diameter should register");

    engine
        .register_provider(
            "planet",
            "computed_gravitational_field_radius_sum",
            Box::new(|db: &dyn Datasource, rec: &Record| {
                let sum = db
                    .related(rec, &ident("gravitational_fields"))
                    .iter()
                    .map(|field| uint_field(field, "radius"))
                    .sum();
                Ok(Value::Uint(sum))
            }),
        )
        .expect("computed_gravitational_field_radius_sum should register");

    engine
        .register_provider(
            "planet",
            "computed_neighbor_count",
            Box::new(|db: &dyn Datasource, rec: &Record| Ok(count_related(db, rec, "neighbors"))),
        )
        .expect("computed_neighbor_count should register");

    engine
        .register_provider(
            "moon",
            "computed_planet_name",
            Box::new(|db: &dyn Datasource, rec: &Record| {
                let name = db
                    .related(rec, &ident("planet"))
                    .first()
                    .and_then(|planet| planet.field(&ident("name")).cloned())
                    .unwrap_or(Value::Null);
                Ok(name)
            }),
        )
        .expect("computed_planet_name should register");

    engine
        .register_provider(
            "gravitational_field",
            "computed_emanates_from_planet",
            Box::new(|db: &dyn Datasource, rec: &Record| {
                let from_planet = db
                    .related(rec, &ident("owner"))
                    .first()
                    .is_some_and(|owner| owner.entity().as_str() == "planet");
                Ok(Value::Bool(from_planet))
            }),
        )
        .expect("computed_emanates_from_planet should register");

    engine
        .register_provider(
            "gravitational_field",
            "computed_radius_doubled",
            Box::new(|_: &dyn Datasource, rec: &Record| Ok(Value::Uint(uint_field(rec, "radius") * 2))),
        )
        .expect("computed_radius_doubled should register");
}

fn count_related(db: &dyn Datasource, rec: &Record, name: &str) -> Value {
    Value::Uint(db.related(rec, &ident(name)).len() as u64)
}

fn uint_field(rec: &Record, column: &str) -> u64 {
    rec.field(&ident(column))
        .and_then(Value::as_uint)
        .unwrap_or(0)
}

/// Foreign-key value for a record key.
pub(crate) fn fk(record: &Record) -> Value {
    Value::Uint(record.key().0)
}
