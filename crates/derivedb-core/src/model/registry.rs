use crate::{
    error::ConfigError,
    ident::{EntityName, Ident},
    model::attribute::{AttributeDecl, AttributeSpec},
    reflect::Relationship,
};

///
/// ModelRegistry
///
/// Per-entity collection of attribute specs plus the relationship snapshot
/// taken at first wiring. Write-once: populated at declaration time, sealed
/// once `wired` flips. `wired` transitions false -> true exactly once.
///

#[derive(Debug)]
pub struct ModelRegistry {
    entity: EntityName,
    attributes: Vec<AttributeSpec>,
    relationships: Vec<Relationship>,
    wired: bool,
}

impl ModelRegistry {
    #[must_use]
    pub(crate) const fn new(entity: EntityName) -> Self {
        Self {
            entity,
            attributes: Vec::new(),
            relationships: Vec::new(),
            wired: false,
        }
    }

    /// Append one declaration. Redeclaring an attribute with identical
    /// options is a no-op; redeclaring with different options is a
    /// configuration error, never a silent merge.
    pub(crate) fn declare(&mut self, decl: &AttributeDecl) -> Result<(), ConfigError> {
        let spec = AttributeSpec::from_decl(&self.entity, decl)?;

        if let Some(existing) = self.attributes.iter().find(|a| a.name == spec.name) {
            if *existing == spec {
                return Ok(());
            }
            return Err(ConfigError::ConflictingAttribute {
                entity: self.entity.clone(),
                attribute: spec.name,
            });
        }

        self.attributes.push(spec);
        Ok(())
    }

    #[must_use]
    pub const fn entity(&self) -> &EntityName {
        &self.entity
    }

    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &Ident) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| &a.name == name)
    }

    /// Relationship snapshot, sorted by name at wiring time.
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    #[must_use]
    pub fn relationship(&self, name: &Ident) -> Option<&Relationship> {
        self.relationships.iter().find(|r| &r.name == name)
    }

    #[must_use]
    pub const fn is_wired(&self) -> bool {
        self.wired
    }

    /// Cache the entity's relationship descriptors, sorted by name.
    /// Descriptors declared after this snapshot are not seen.
    pub(crate) fn snapshot_relationships(&mut self, mut relationships: Vec<Relationship>) {
        relationships.sort_by(|a, b| a.name.cmp(&b.name));
        self.relationships = relationships;
    }

    pub(crate) const fn mark_wired(&mut self) {
        self.wired = true;
    }
}
