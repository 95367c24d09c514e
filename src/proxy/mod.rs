//! Typed views of decoded objects.
//!
//! Game classes carry many fields whose values only appear in a package when they differ
//! from the class default. A proxy schema declares, per class, the fields consumers care
//! about together with their defaults; a [`ProxyInstance`] overlays one decoded object on
//! that schema so every field reads the same whether or not the package stored it, while
//! still recording which fields came from real data.
//!
//! # Schemas
//!
//! Schemas are declared by hand with [`ProxyDeclaration`] and registered in a
//! [`SchemaRegistry`]. A declaration may extend one registered parent. At registration the
//! parent chain is flattened root to leaf into a single default map; a field declared again
//! lower in the chain replaces the inherited one.
//!
//! ```rust
//! use uepkg::proxy::{values::{floats, strings}, ProxyDeclaration, SchemaRegistry};
//!
//! let registry = SchemaRegistry::new();
//! registry.register(
//!     ProxyDeclaration::new("PrimalItem")
//!         .field("DescriptiveNameBase", strings(["Item"]))
//!         .field("BaseItemWeight", floats([0.5_f32])),
//! )?;
//! registry.register(
//!     ProxyDeclaration::new("PrimalItemResource")
//!         .extends("PrimalItem")
//!         .field("BaseItemWeight", floats([0.1_f32])),
//! )?;
//!
//! let schema = registry.schema("PrimalItemResource").unwrap();
//! assert_eq!(schema.defaults().len(), 2);
//! assert!(registry.is_subtype("PrimalItemResource", "PrimalItem"));
//! # Ok::<(), uepkg::Error>(())
//! ```

mod instance;
pub mod values;

use std::{collections::BTreeMap, sync::Arc};

use dashmap::{mapref::entry::Entry, DashMap};
use log::debug;

pub use crate::package::properties::FieldValues;
pub use instance::ProxyInstance;

use crate::{Error, Result};

/// A hand-written schema declaration for one class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProxyDeclaration {
    ue_type: String,
    parents: Vec<String>,
    fields: BTreeMap<String, FieldValues>,
    root: bool,
}

impl ProxyDeclaration {
    /// Declares the schema of `ue_type`.
    pub fn new(ue_type: impl Into<String>) -> Self {
        ProxyDeclaration {
            ue_type: ue_type.into(),
            ..Self::default()
        }
    }

    /// The empty root schema. It is the only schema allowed without a type identifier.
    #[must_use]
    pub fn empty() -> Self {
        ProxyDeclaration {
            root: true,
            ..Self::default()
        }
    }

    /// Names the parent schema.
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Declares a field with its default values.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, defaults: FieldValues) -> Self {
        self.fields.insert(name.into(), defaults);
        self
    }

    /// The declared type identifier.
    #[must_use]
    pub fn ue_type(&self) -> &str {
        &self.ue_type
    }
}

/// A registered, flattened schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxySchema {
    declaration: ProxyDeclaration,
    /// Ancestors from the root down to the direct parent
    ancestors: Vec<String>,
    defaults: BTreeMap<String, FieldValues>,
}

impl ProxySchema {
    /// Type identifier.
    #[must_use]
    pub fn ue_type(&self) -> &str {
        &self.declaration.ue_type
    }

    /// Direct parent, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.declaration.parents.first().map(String::as_str)
    }

    /// Ancestors from the root down to the direct parent.
    #[must_use]
    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    /// Flattened field defaults, own and inherited.
    #[must_use]
    pub fn defaults(&self) -> &BTreeMap<String, FieldValues> {
        &self.defaults
    }

    /// Fields declared by this schema itself.
    #[must_use]
    pub fn declared(&self) -> &BTreeMap<String, FieldValues> {
        &self.declaration.fields
    }
}

/// Registered schemas, keyed by type identifier.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, Arc<ProxySchema>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a declaration, flattening its ancestor chain.
    ///
    /// Registering an identical declaration again returns the existing schema.
    ///
    /// # Errors
    /// - [`crate::Error::MultipleInheritance`] if more than one parent is named
    /// - [`crate::Error::MissingTypeId`] if the type identifier is empty outside the root
    /// - [`crate::Error::DuplicateSchema`] if a different declaration has the same type
    /// - [`crate::Error::UnknownParent`] if the parent is not registered
    pub fn register(&self, declaration: ProxyDeclaration) -> Result<Arc<ProxySchema>> {
        if declaration.parents.len() > 1 {
            return Err(Error::MultipleInheritance(declaration.ue_type));
        }

        if declaration.ue_type.is_empty() && !declaration.root {
            return Err(Error::MissingTypeId);
        }

        // Looked up before the entry is taken; the parent may live in the same shard
        let parent = declaration
            .parents
            .first()
            .map(|parent| (parent.clone(), self.schema(parent)));

        let slot = match self.schemas.entry(declaration.ue_type.clone()) {
            Entry::Occupied(existing) => {
                if existing.get().declaration == declaration {
                    return Ok(existing.get().clone());
                }
                return Err(Error::DuplicateSchema(declaration.ue_type));
            }
            Entry::Vacant(slot) => slot,
        };

        let (ancestors, mut defaults) = match parent {
            Some((parent, Some(parent_schema))) => {
                let mut ancestors = parent_schema.ancestors.clone();
                ancestors.push(parent);
                (ancestors, parent_schema.defaults.clone())
            }
            Some((parent, None)) => {
                return Err(Error::UnknownParent {
                    ue_type: declaration.ue_type.clone(),
                    parent,
                });
            }
            None => (Vec::new(), BTreeMap::new()),
        };

        for (name, values) in &declaration.fields {
            defaults.insert(name.clone(), values.clone());
        }

        debug!(
            "Registered proxy schema '{}' ({} fields, {} ancestors)",
            declaration.ue_type,
            defaults.len(),
            ancestors.len()
        );

        let schema = Arc::new(ProxySchema {
            declaration,
            ancestors,
            defaults,
        });
        slot.insert(schema.clone());
        Ok(schema)
    }

    /// The schema registered for `ue_type`.
    #[must_use]
    pub fn schema(&self, ue_type: &str) -> Option<Arc<ProxySchema>> {
        self.schemas.get(ue_type).map(|entry| entry.value().clone())
    }

    /// A fresh instance of the schema registered for `ue_type`.
    #[must_use]
    pub fn proxy_for_type(&self, ue_type: &str) -> Option<ProxyInstance> {
        self.schema(ue_type)
            .map(|schema| ProxyInstance::new(&schema))
    }

    /// Returns `true` if `ancestor` appears in the parent chain of `ue_type`.
    #[must_use]
    pub fn is_subtype(&self, ue_type: &str, ancestor: &str) -> bool {
        self.schema(ue_type)
            .is_some_and(|schema| schema.ancestors.iter().any(|name| name == ancestor))
    }

    /// Ancestors of `ue_type`, root first. Empty for unknown types.
    #[must_use]
    pub fn ancestors(&self, ue_type: &str) -> Vec<String> {
        self.schema(ue_type)
            .map(|schema| schema.ancestors.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if `ue_type` is registered.
    #[must_use]
    pub fn contains(&self, ue_type: &str) -> bool {
        self.schemas.contains_key(ue_type)
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
