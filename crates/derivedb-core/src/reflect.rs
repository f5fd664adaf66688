//! Relationship descriptors.
//!
//! A descriptor is a normalized view of one relationship edge between two
//! record types, supplied by the reflection collaborator. Descriptors must
//! carry concrete names: the engine never infers inverse spellings at
//! mutation time.

use crate::{
    error::ConfigError,
    ident::{EntityName, Ident},
};
use derive_more::Display;
use serde::Serialize;

///
/// RelationKind
///
/// Closed set of relationship kinds the resolver dispatches over.
/// New kinds are a compile-time-checked extension point.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum RelationKind {
    /// The opposite record is linked through a join table.
    #[display("many_to_many")]
    ManyToMany,
    /// The host record points at the opposite record ("belongs to").
    #[display("owned_singular")]
    OwnedSingular,
    /// Opposite records point back at the host ("has many").
    #[display("owning_collection")]
    OwningCollection,
    /// One opposite record points back at the host ("has one").
    #[display("owning_singular")]
    OwningSingular,
    /// Two hops: host -> child -> grandchild ("through").
    #[display("transitive")]
    Transitive,
}

///
/// Relationship
///
/// One relationship edge. Snapshot ownership is the model registry:
/// descriptors declared after wiring are not seen.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Relationship {
    /// Relationship name on the host type.
    pub name: Ident,
    pub kind: RelationKind,
    /// Opposite type; absent only for a polymorphic owned-singular edge,
    /// whose opposite is determined per record at runtime.
    pub target: Option<EntityName>,
    /// Relationship name on the opposite type leading back to the host.
    pub inverse: Option<Ident>,
    /// Polymorphic marker; the interface name the opposite side declares.
    pub polymorphic: Option<Ident>,
    /// Host -> child association of a transitive edge.
    pub through: Option<Box<Relationship>>,
}

impl Relationship {
    /// Owned-singular edge: the host points at `target`.
    #[must_use]
    pub const fn owned(name: Ident, target: EntityName, inverse: Ident) -> Self {
        Self {
            name,
            kind: RelationKind::OwnedSingular,
            target: Some(target),
            inverse: Some(inverse),
            polymorphic: None,
            through: None,
        }
    }

    /// Polymorphic owned-singular edge: the host carries `<marker>` columns
    /// naming the opposite type per record.
    #[must_use]
    pub const fn owned_polymorphic(name: Ident, marker: Ident) -> Self {
        Self {
            name,
            kind: RelationKind::OwnedSingular,
            target: None,
            inverse: None,
            polymorphic: Some(marker),
            through: None,
        }
    }

    /// Owning-singular edge: one `target` record points back at the host.
    #[must_use]
    pub const fn owning_one(name: Ident, target: EntityName, inverse: Ident) -> Self {
        Self {
            name,
            kind: RelationKind::OwningSingular,
            target: Some(target),
            inverse: Some(inverse),
            polymorphic: None,
            through: None,
        }
    }

    /// Owning-collection edge: `target` records point back at the host.
    #[must_use]
    pub const fn owning_many(name: Ident, target: EntityName, inverse: Ident) -> Self {
        Self {
            name,
            kind: RelationKind::OwningCollection,
            target: Some(target),
            inverse: Some(inverse),
            polymorphic: None,
            through: None,
        }
    }

    /// Many-to-many edge through a join table.
    #[must_use]
    pub const fn many_to_many(name: Ident, target: EntityName, inverse: Ident) -> Self {
        Self {
            name,
            kind: RelationKind::ManyToMany,
            target: Some(target),
            inverse: Some(inverse),
            polymorphic: None,
            through: None,
        }
    }

    /// Transitive edge: host -> `through` -> `target`.
    #[must_use]
    pub fn transitive(name: Ident, target: EntityName, through: Self) -> Self {
        Self {
            name,
            kind: RelationKind::Transitive,
            target: Some(target),
            inverse: None,
            polymorphic: None,
            through: Some(Box::new(through)),
        }
    }

    /// Tag an owning or many-to-many edge with a polymorphic marker
    /// (the opposite side declares the host through `<marker>` columns).
    #[must_use]
    pub fn with_marker(mut self, marker: Ident) -> Self {
        self.polymorphic = Some(marker);
        self
    }

    #[must_use]
    pub const fn is_polymorphic(&self) -> bool {
        self.polymorphic.is_some()
    }

    pub(crate) fn require_target(&self, entity: &EntityName) -> Result<&EntityName, ConfigError> {
        self.target.as_ref().ok_or_else(|| ConfigError::MissingTarget {
            entity: entity.clone(),
            relationship: self.name.clone(),
        })
    }

    pub(crate) fn require_inverse(&self, entity: &EntityName) -> Result<&Ident, ConfigError> {
        self.inverse.as_ref().ok_or_else(|| ConfigError::MissingInverse {
            entity: entity.clone(),
            relationship: self.name.clone(),
        })
    }

    pub(crate) fn require_through(&self, entity: &EntityName) -> Result<&Self, ConfigError> {
        self.through
            .as_deref()
            .ok_or_else(|| ConfigError::MissingThrough {
                entity: entity.clone(),
                relationship: self.name.clone(),
            })
    }
}
