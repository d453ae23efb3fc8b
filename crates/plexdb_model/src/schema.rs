//! Schema catalog: item types, property types and their registry.
//!
//! The schema is consumed as an opaque, already-validated catalog. The
//! model never invents types: records are only constructed and
//! deserialized against types previously registered here.

use crate::error::{ModelError, ModelResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The declared value kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Free text.
    String,
    /// Double-precision number, canonical decimal on the wire.
    Double,
    /// `true` / `false`.
    Boolean,
    /// UTC timestamp, millisecond precision on the wire.
    DateTime,
    /// Reference to another item, by id.
    Item,
    /// Index into a schema-defined list.
    List,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::String => "String",
            PropertyKind::Double => "Double",
            PropertyKind::Boolean => "Boolean",
            PropertyKind::DateTime => "DateTime",
            PropertyKind::Item => "Item",
            PropertyKind::List => "List",
        };
        f.write_str(name)
    }
}

/// A named, typed property slot on an item type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyType {
    name: String,
    kind: PropertyKind,
}

impl PropertyType {
    /// Creates a new property type.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared value kind.
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.kind
    }
}

/// Which record variant an item type describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Plain item.
    Item,
    /// Typed link between items; records carry a parent branch.
    Relationship,
    /// Item whose payload is an opaque blob in the vault.
    File,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Item => "item",
            TypeKind::Relationship => "relationship",
            TypeKind::File => "file",
        };
        f.write_str(name)
    }
}

/// An item type: a name, a kind and its property slots.
#[derive(Debug, Clone)]
pub struct ItemType {
    name: String,
    kind: TypeKind,
    properties: BTreeMap<String, PropertyType>,
}

impl ItemType {
    /// Creates a plain item type.
    pub fn item(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Item)
    }

    /// Creates a relationship type.
    pub fn relationship(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Relationship)
    }

    /// Creates a file type.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::File)
    }

    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: BTreeMap::new(),
        }
    }

    /// Adds a property slot to the type.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, kind: PropertyKind) -> Self {
        let property = PropertyType::new(name, kind);
        self.properties.insert(property.name().to_string(), property);
        self
    }

    /// Returns the type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type kind.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Resolves a property slot by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyType> {
        self.properties.get(name)
    }

    /// Resolves a property slot by name, failing if it is unknown.
    pub fn require_property(&self, name: &str) -> ModelResult<&PropertyType> {
        self.property(name)
            .ok_or_else(|| ModelError::unknown_property_type(&self.name, name))
    }

    /// Iterates over the property slots.
    pub fn properties(&self) -> impl Iterator<Item = &PropertyType> {
        self.properties.values()
    }
}

/// Name-keyed registry of item types.
///
/// Registering a name again replaces the prior entry (idempotent).
/// The catalog is shared between the caller thread and the downloader,
/// so lookups and registration are guarded by a single lock.
#[derive(Debug, Default)]
pub struct Catalog {
    types: RwLock<HashMap<String, Arc<ItemType>>>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an item type, replacing any prior entry with that name.
    ///
    /// Returns the shared handle callers use to build records and queries.
    pub fn register(&self, item_type: ItemType) -> Arc<ItemType> {
        let entry = Arc::new(item_type);
        self.types
            .write()
            .insert(entry.name().to_string(), Arc::clone(&entry));
        entry
    }

    /// Looks up an item type by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ItemType>> {
        self.types.read().get(name).cloned()
    }

    /// Looks up an item type by name, failing if it is unknown.
    pub fn resolve(&self, name: &str) -> ModelResult<Arc<ItemType>> {
        self.get(name)
            .ok_or_else(|| ModelError::unknown_item_type(name))
    }
}
