//! Error types for the plexdb model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A record referenced an item type name missing from the catalog.
    #[error("unknown item type: {name}")]
    UnknownItemType {
        /// The unresolved type name.
        name: String,
    },

    /// A record referenced a property name missing from its item type.
    #[error("unknown property type {name} on item type {item_type}")]
    UnknownPropertyType {
        /// The owning item type.
        item_type: String,
        /// The unresolved property name.
        name: String,
    },

    /// An item type was used where a different kind was required.
    #[error("item type {name} is not a {expected} type")]
    KindMismatch {
        /// The offending type name.
        name: String,
        /// The kind that was required.
        expected: String,
    },

    /// A property was read before any value was set for it.
    #[error("property not set: {name}")]
    PropertyNotSet {
        /// The property name.
        name: String,
    },

    /// A textual value could not be parsed per its declared property kind.
    #[error("invalid value for property {property}: {message}")]
    InvalidValue {
        /// The property whose value failed to parse.
        property: String,
        /// Description of the parse failure.
        message: String,
    },

    /// A serialized record is malformed.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the format issue.
        message: String,
    },

    /// A capability gap, not a data problem.
    #[error("not supported: {message}")]
    NotSupported {
        /// Description of the unsupported operation.
        message: String,
    },
}

impl ModelError {
    /// Creates an unknown item type error.
    pub fn unknown_item_type(name: impl Into<String>) -> Self {
        Self::UnknownItemType { name: name.into() }
    }

    /// Creates an unknown property type error.
    pub fn unknown_property_type(item_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownPropertyType {
            item_type: item_type.into(),
            name: name.into(),
        }
    }

    /// Creates a kind mismatch error.
    pub fn kind_mismatch(name: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::KindMismatch {
            name: name.into(),
            expected: expected.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Creates a not supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }
}
