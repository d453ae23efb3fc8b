//! Typed property values and their textual wire format.

use crate::error::{ModelError, ModelResult};
use crate::schema::PropertyKind;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Fixed millisecond-precision pattern for `DateTime` values on the wire.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Free text.
    String(String),
    /// Double-precision number.
    Double(f64),
    /// Boolean.
    Boolean(bool),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// Reference to another item, by id.
    ItemRef(Uuid),
    /// Index into a schema-defined list.
    ListIndex(i32),
}

impl Value {
    /// Returns the kind this value belongs to.
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        match self {
            Value::String(_) => PropertyKind::String,
            Value::Double(_) => PropertyKind::Double,
            Value::Boolean(_) => PropertyKind::Boolean,
            Value::DateTime(_) => PropertyKind::DateTime,
            Value::ItemRef(_) => PropertyKind::Item,
            Value::ListIndex(_) => PropertyKind::List,
        }
    }

    /// Formats the value per its kind's wire format.
    #[must_use]
    pub fn format(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Double(d) => format!("{d}"),
            Value::Boolean(b) => format!("{b}"),
            Value::DateTime(dt) => dt.naive_utc().format(DATETIME_FORMAT).to_string(),
            Value::ItemRef(id) => id.to_string(),
            Value::ListIndex(i) => format!("{i}"),
        }
    }

    /// Parses a textual value per its declared kind.
    ///
    /// An empty text is "no value" for every kind, matching the
    /// serialization of absent values.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidValue`] if the text cannot be parsed
    /// per the declared kind. `property` only labels the error.
    pub fn parse(kind: PropertyKind, property: &str, text: &str) -> ModelResult<Option<Self>> {
        if text.is_empty() {
            return Ok(None);
        }

        let value = match kind {
            PropertyKind::String => Value::String(text.to_string()),
            PropertyKind::Double => Value::Double(
                text.parse::<f64>()
                    .map_err(|e| ModelError::invalid_value(property, e.to_string()))?,
            ),
            PropertyKind::Boolean => Value::Boolean(
                text.parse::<bool>()
                    .map_err(|e| ModelError::invalid_value(property, e.to_string()))?,
            ),
            PropertyKind::DateTime => {
                let naive = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                    .map_err(|e| ModelError::invalid_value(property, e.to_string()))?;
                Value::DateTime(naive.and_utc())
            }
            PropertyKind::Item => Value::ItemRef(
                Uuid::parse_str(text)
                    .map_err(|e| ModelError::invalid_value(property, e.to_string()))?,
            ),
            PropertyKind::List => Value::ListIndex(
                text.parse::<i32>()
                    .map_err(|e| ModelError::invalid_value(property, e.to_string()))?,
            ),
        };
        Ok(Some(value))
    }

    /// Returns the string payload, or `None` for other kinds.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}
