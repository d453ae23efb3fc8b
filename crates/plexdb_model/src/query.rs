//! Condition-based queries over record properties.

use crate::error::{ModelError, ModelResult};
use crate::schema::{ItemType, TypeKind};
use crate::value::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Comparison operator for a property condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// A single property comparison.
#[derive(Debug, Clone)]
pub struct Condition {
    property: String,
    operator: ConditionOperator,
    value: Value,
}

impl Condition {
    /// Creates a condition comparing `property` against a literal.
    pub fn new(property: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            property: property.into(),
            operator,
            value,
        }
    }

    /// Returns the property name the condition targets.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Returns the comparison operator.
    #[must_use]
    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    /// Returns the literal compared against.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A query over one item type, optionally narrowed by a condition.
#[derive(Debug, Clone)]
pub struct ItemQuery {
    item_type: Arc<ItemType>,
    condition: Option<Condition>,
}

impl ItemQuery {
    /// Creates a query matching every current record of `item_type`.
    pub fn new(item_type: Arc<ItemType>) -> Self {
        Self {
            item_type,
            condition: None,
        }
    }

    /// Narrows the query with a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Returns the queried item type.
    #[must_use]
    pub fn item_type(&self) -> &Arc<ItemType> {
        &self.item_type
    }

    /// Returns the condition, if any.
    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }
}

/// An item query over a relationship type, scoped to one parent branch.
#[derive(Debug, Clone)]
pub struct RelationshipQuery {
    item: ItemQuery,
    parent_branch_id: Uuid,
}

impl RelationshipQuery {
    /// Creates a relationship query.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::KindMismatch`] if the underlying query's
    /// type is not a relationship type.
    pub fn new(item: ItemQuery, parent_branch_id: Uuid) -> ModelResult<Self> {
        if item.item_type().kind() != TypeKind::Relationship {
            return Err(ModelError::kind_mismatch(
                item.item_type().name(),
                TypeKind::Relationship.to_string(),
            ));
        }
        Ok(Self {
            item,
            parent_branch_id,
        })
    }

    /// Returns the base item query.
    #[must_use]
    pub fn item(&self) -> &ItemQuery {
        &self.item
    }

    /// Returns the parent branch the relationships must be attached to.
    #[must_use]
    pub fn parent_branch_id(&self) -> Uuid {
        self.parent_branch_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_query_requires_relationship_type() {
        let part = Arc::new(ItemType::item("Part"));
        let err = RelationshipQuery::new(ItemQuery::new(part), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }
}
