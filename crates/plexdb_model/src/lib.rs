//! # plexdb Model
//!
//! Schema catalog, typed values, versioned records and the on-disk XML
//! record format for plexdb.
//!
//! This crate provides:
//! - Schema types (`ItemType`, `PropertyType`, `Catalog`) consumed as an
//!   opaque, already-validated catalog
//! - Typed property values with per-kind textual formatting
//! - `Record`: the item/relationship/file entity with branch/version
//!   lifecycle fields
//! - Condition-based queries and their evaluation against records
//! - XML serialization/deserialization of records through the catalog
//!
//! ## Key Invariants
//!
//! - Records are immutable once written, except for the supersession
//!   timestamp (`superseded`), which is set at most once by a later
//!   supersede operation
//! - Serialization round-trips: absent property values serialize as an
//!   empty value and deserialize back to "no value"
//! - Deserialization resolves every type name through the catalog and
//!   fails on unknown names rather than guessing

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod query;
mod record;
mod schema;
mod value;
pub mod xml;

pub use error::{ModelError, ModelResult};
pub use query::{Condition, ConditionOperator, ItemQuery, RelationshipQuery};
pub use record::{Record, RecordKind, NOT_SUPERSEDED};
pub use schema::{Catalog, ItemType, PropertyKind, PropertyType, TypeKind};
pub use value::{Value, DATETIME_FORMAT};
