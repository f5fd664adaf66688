use crate::{
    RESERVED_ALL,
    error::ConfigError,
    ident::{EntityName, Ident},
};
use serde::Serialize;

///
/// AttributeDecl
///
/// Declaration options for one computed attribute, accumulated before
/// wiring. Raw strings; validation happens when the declaration reaches a
/// registry. Equality over the full option tuple drives redeclaration
/// idempotence.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttributeDecl {
    name: String,
    depends: Vec<String>,
    persist_on_save: bool,
    uses: Option<String>,
}

impl AttributeDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends: Vec::new(),
            persist_on_save: false,
            uses: None,
        }
    }

    /// Add dependency names in declaration order.
    #[must_use]
    pub fn depends<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Recompute on every host save, not only when a dependency changes.
    #[must_use]
    pub const fn persist_on_save(mut self) -> Self {
        self.persist_on_save = true;
        self
    }

    /// Capability tag matched by filtered recompute calls.
    #[must_use]
    pub fn uses(mut self, tag: impl Into<String>) -> Self {
        self.uses = Some(tag.into());
        self
    }
}

///
/// AttributeSpec
///
/// One declared computed attribute after validation.
/// Immutable for process lifetime.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AttributeSpec {
    pub name: Ident,
    /// Ordered, deduplicated dependency names.
    pub dependencies: Vec<Ident>,
    pub persist_on_save: bool,
    pub uses: Option<Ident>,
    pub owner: EntityName,
}

impl AttributeSpec {
    pub(crate) fn from_decl(owner: &EntityName, decl: &AttributeDecl) -> Result<Self, ConfigError> {
        if decl.name == RESERVED_ALL {
            return Err(ConfigError::ReservedAttributeName);
        }
        let name = Ident::try_from_str(&decl.name)?;

        let mut dependencies = Vec::new();
        for dep in &decl.depends {
            let dep = Ident::try_from_str(dep)?;
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        let uses = decl
            .uses
            .as_deref()
            .map(Ident::try_from_str)
            .transpose()?;

        Ok(Self {
            name,
            dependencies,
            persist_on_save: decl.persist_on_save,
            uses,
            owner: owner.clone(),
        })
    }

    /// Conventional provider name for this attribute.
    #[must_use]
    pub fn provider_name(&self) -> String {
        format!("computed_{}", self.name)
    }

    /// True when this spec declares a dependency on `name`.
    #[must_use]
    pub fn depends_on(&self, name: &Ident) -> bool {
        self.dependencies.contains(name)
    }

    /// True when this spec matches a capability tag: it either depends on
    /// the tag or declared it as its own `uses` tag.
    #[must_use]
    pub fn matches_uses(&self, tag: &Ident) -> bool {
        self.depends_on(tag) || self.uses.as_ref() == Some(tag)
    }
}
