//! Versioned records: items, relationships and files.
//!
//! A `Record` is one immutable snapshot of a branch. The only field that
//! may change after it is written is the supersession timestamp, set at
//! most once when a later version replaces it. That field is an atomic
//! so a cached record can be superseded in place while concurrent
//! readers scan the cache.

use crate::error::{ModelError, ModelResult};
use crate::query::{Condition, ConditionOperator, ItemQuery, RelationshipQuery};
use crate::schema::{ItemType, PropertyKind, TypeKind};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Sentinel supersession timestamp meaning "current".
pub const NOT_SUPERSEDED: i64 = -1;

/// The closed set of record variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Plain item.
    Item,
    /// Typed link attached to a parent item's branch.
    Relationship {
        /// Branch of the item this relationship is attached to.
        parent_branch_id: Uuid,
    },
    /// Item whose payload lives in the vault, addressed by version id.
    File,
}

impl RecordKind {
    /// Returns the record-file suffix distinguishing this kind on disk.
    #[must_use]
    pub fn file_suffix(&self) -> &'static str {
        match self {
            RecordKind::Item => ".item.xml",
            RecordKind::Relationship { .. } => ".relationship.xml",
            RecordKind::File => ".file.xml",
        }
    }

    /// Returns the type kind this record kind requires of its schema type.
    #[must_use]
    pub fn type_kind(&self) -> TypeKind {
        match self {
            RecordKind::Item => TypeKind::Item,
            RecordKind::Relationship { .. } => TypeKind::Relationship,
            RecordKind::File => TypeKind::File,
        }
    }
}

/// One immutable version of an item, relationship or file.
#[derive(Debug)]
pub struct Record {
    item_type: Arc<ItemType>,
    kind: RecordKind,
    item_id: Uuid,
    branch_id: Uuid,
    version_id: Uuid,
    branched: i64,
    versioned: i64,
    superseded: AtomicI64,
    properties: BTreeMap<String, Option<Value>>,
}

impl Record {
    /// Creates a record of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::KindMismatch`] if the item type's kind does
    /// not match the record kind.
    pub fn new(
        item_type: Arc<ItemType>,
        kind: RecordKind,
        item_id: Uuid,
        branch_id: Uuid,
        version_id: Uuid,
        branched: i64,
        versioned: i64,
    ) -> ModelResult<Self> {
        if item_type.kind() != kind.type_kind() {
            return Err(ModelError::kind_mismatch(
                item_type.name(),
                kind.type_kind().to_string(),
            ));
        }
        Ok(Self {
            item_type,
            kind,
            item_id,
            branch_id,
            version_id,
            branched,
            versioned,
            superseded: AtomicI64::new(NOT_SUPERSEDED),
            properties: BTreeMap::new(),
        })
    }

    /// Creates a plain item record with a fresh branch and version.
    pub fn item(item_type: Arc<ItemType>, branched: i64, versioned: i64) -> ModelResult<Self> {
        Self::new(
            item_type,
            RecordKind::Item,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            branched,
            versioned,
        )
    }

    /// Creates a relationship record attached to `parent_branch_id`.
    pub fn relationship(
        item_type: Arc<ItemType>,
        parent_branch_id: Uuid,
        branched: i64,
        versioned: i64,
    ) -> ModelResult<Self> {
        Self::new(
            item_type,
            RecordKind::Relationship { parent_branch_id },
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            branched,
            versioned,
        )
    }

    /// Creates a file record; its payload is addressed by the version id.
    pub fn file(item_type: Arc<ItemType>, branched: i64, versioned: i64) -> ModelResult<Self> {
        Self::new(
            item_type,
            RecordKind::File,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            branched,
            versioned,
        )
    }

    /// Returns the schema type of this record.
    #[must_use]
    pub fn item_type(&self) -> &Arc<ItemType> {
        &self.item_type
    }

    /// Returns the record kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns the item id, stable across versions.
    #[must_use]
    pub fn item_id(&self) -> Uuid {
        self.item_id
    }

    /// Returns the branch id.
    #[must_use]
    pub fn branch_id(&self) -> Uuid {
        self.branch_id
    }

    /// Returns the version id, unique per revision.
    #[must_use]
    pub fn version_id(&self) -> Uuid {
        self.version_id
    }

    /// Returns the branch-creation timestamp.
    #[must_use]
    pub fn branched(&self) -> i64 {
        self.branched
    }

    /// Returns the version-creation timestamp.
    #[must_use]
    pub fn versioned(&self) -> i64 {
        self.versioned
    }

    /// Returns the supersession timestamp, [`NOT_SUPERSEDED`] if current.
    #[must_use]
    pub fn superseded(&self) -> i64 {
        self.superseded.load(Ordering::Acquire)
    }

    /// Returns true if no later version has superseded this one.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.superseded() == NOT_SUPERSEDED
    }

    /// Marks this version as superseded at the given timestamp.
    pub fn set_superseded(&self, timestamp: i64) {
        self.superseded.store(timestamp, Ordering::Release);
    }

    /// Restores a supersession timestamp read from disk.
    pub(crate) fn restore_superseded(&self, timestamp: i64) {
        self.superseded.store(timestamp, Ordering::Release);
    }

    /// Sets a property value.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown on this record's type, or the
    /// value's kind does not match the declared kind.
    pub fn set_property(&mut self, name: &str, value: Option<Value>) -> ModelResult<()> {
        let property = self.item_type.require_property(name)?;
        if let Some(ref value) = value {
            if value.kind() != property.kind() {
                return Err(ModelError::invalid_value(
                    name,
                    format!("expected {} value, got {}", property.kind(), value.kind()),
                ));
            }
        }
        self.properties.insert(name.to_string(), value);
        Ok(())
    }

    /// Returns the value of a property.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::PropertyNotSet`] if the property was never
    /// set on this record. A property set to "no value" returns
    /// `Ok(None)`.
    pub fn property(&self, name: &str) -> ModelResult<Option<&Value>> {
        self.properties
            .get(name)
            .map(Option::as_ref)
            .ok_or_else(|| ModelError::PropertyNotSet {
                name: name.to_string(),
            })
    }

    /// Read-only view of the property bag.
    pub fn properties(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Returns the on-disk file name for this record.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{}", self.version_id, self.kind.file_suffix())
    }

    /// Returns the relationship parent branch, if this is a relationship.
    #[must_use]
    pub fn parent_branch_id(&self) -> Option<Uuid> {
        match self.kind {
            RecordKind::Relationship { parent_branch_id } => Some(parent_branch_id),
            _ => None,
        }
    }

    /// Evaluates an item query against this record.
    ///
    /// Superseded records never match. A query without a condition
    /// matches every current record.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotSupported`] if the condition compares a
    /// non-`String` property; only `String` comparisons are implemented
    /// in this version.
    pub fn matches_item_query(&self, query: &ItemQuery) -> ModelResult<bool> {
        if !self.is_current() {
            return Ok(false);
        }
        match query.condition() {
            None => Ok(true),
            Some(condition) => self.evaluate_condition(condition),
        }
    }

    /// Evaluates a relationship query against this record.
    ///
    /// Matches only when the parent branch equals the query's parent
    /// branch and the base item query matches.
    pub fn matches_relationship_query(&self, query: &RelationshipQuery) -> ModelResult<bool> {
        match self.kind {
            RecordKind::Relationship { parent_branch_id } => {
                if parent_branch_id != query.parent_branch_id() {
                    return Ok(false);
                }
                self.matches_item_query(query.item())
            }
            _ => Ok(false),
        }
    }

    fn evaluate_condition(&self, condition: &Condition) -> ModelResult<bool> {
        let property = self.item_type.require_property(condition.property())?;
        if property.kind() != PropertyKind::String {
            return Err(ModelError::not_supported(format!(
                "condition on {} property {}: only String comparisons are implemented",
                property.kind(),
                property.name(),
            )));
        }
        let literal = condition.value().as_str().ok_or_else(|| {
            ModelError::not_supported(format!(
                "non-String literal in condition on property {}",
                property.name(),
            ))
        })?;

        // A record with no value for the property matches no operator.
        let value = match self.properties.get(condition.property()) {
            Some(Some(value)) => value,
            _ => return Ok(false),
        };
        let text = value.as_str().ok_or_else(|| {
            ModelError::invalid_value(condition.property(), "stored value is not a String")
        })?;

        let ordering = ordinal_ignore_case(text, literal);
        let matched = match condition.operator() {
            ConditionOperator::Eq => ordering.is_eq(),
            ConditionOperator::Ne => ordering.is_ne(),
            ConditionOperator::Lt => ordering.is_lt(),
            ConditionOperator::Le => ordering.is_le(),
            ConditionOperator::Gt => ordering.is_gt(),
            ConditionOperator::Ge => ordering.is_ge(),
        };
        Ok(matched)
    }
}

/// Case-insensitive ordinal comparison: a byte-wise ASCII case fold,
/// no locale rules and no allocation.
fn ordinal_ignore_case(lhs: &str, rhs: &str) -> std::cmp::Ordering {
    let lhs = lhs.bytes().map(|b| b.to_ascii_lowercase());
    let rhs = rhs.bytes().map(|b| b.to_ascii_lowercase());
    lhs.cmp(rhs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ItemType;

    fn part_type() -> Arc<ItemType> {
        Arc::new(
            ItemType::item("Part")
                .with_property("Name", PropertyKind::String)
                .with_property("Weight", PropertyKind::Double),
        )
    }

    #[test]
    fn kind_must_match_type() {
        let part = part_type();
        let err = Record::relationship(Arc::clone(&part), Uuid::new_v4(), 0, 0).unwrap_err();
        assert!(matches!(err, ModelError::KindMismatch { .. }));
    }

    #[test]
    fn property_never_set_fails() {
        let record = Record::item(part_type(), 0, 0).unwrap();
        let err = record.property("Name").unwrap_err();
        assert!(matches!(err, ModelError::PropertyNotSet { .. }));
    }

    #[test]
    fn null_property_reads_as_no_value() {
        let mut record = Record::item(part_type(), 0, 0).unwrap();
        record.set_property("Name", None).unwrap();
        assert_eq!(record.property("Name").unwrap(), None);
    }

    #[test]
    fn set_property_checks_kind() {
        let mut record = Record::item(part_type(), 0, 0).unwrap();
        let err = record
            .set_property("Weight", Some(Value::String("heavy".into())))
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { .. }));
    }

    #[test]
    fn query_matching_is_case_insensitive_and_skips_superseded() {
        let part = part_type();
        let mut a = Record::item(Arc::clone(&part), 1, 1).unwrap();
        a.set_property("Name", Some(Value::String("Widget".into())))
            .unwrap();
        let mut b = Record::item(Arc::clone(&part), 2, 2).unwrap();
        b.set_property("Name", Some(Value::String("widget".into())))
            .unwrap();
        b.set_superseded(3);

        let query = ItemQuery::new(Arc::clone(&part)).with_condition(Condition::new(
            "Name",
            ConditionOperator::Eq,
            Value::String("WIDGET".into()),
        ));
        assert!(a.matches_item_query(&query).unwrap());
        assert!(!b.matches_item_query(&query).unwrap());
    }

    #[test]
    fn string_ordering_operators() {
        let part = part_type();
        let mut record = Record::item(Arc::clone(&part), 1, 1).unwrap();
        record
            .set_property("Name", Some(Value::String("Bolt".into())))
            .unwrap();

        let query = |op| {
            ItemQuery::new(Arc::clone(&part)).with_condition(Condition::new(
                "Name",
                op,
                Value::String("casing".into()),
            ))
        };
        assert!(record.matches_item_query(&query(ConditionOperator::Lt)).unwrap());
        assert!(record.matches_item_query(&query(ConditionOperator::Le)).unwrap());
        assert!(!record.matches_item_query(&query(ConditionOperator::Gt)).unwrap());
        assert!(record.matches_item_query(&query(ConditionOperator::Ne)).unwrap());
    }

    #[test]
    fn comparison_is_ordinal_ascii_fold() {
        use std::cmp::Ordering;
        assert_eq!(ordinal_ignore_case("Widget", "wIDGET"), Ordering::Equal);
        assert_eq!(ordinal_ignore_case("ABC", "abd"), Ordering::Less);
        // Non-ASCII bytes compare by value, no locale case mapping.
        assert_eq!(ordinal_ignore_case("é", "É"), Ordering::Greater);
    }

    #[test]
    fn non_string_condition_is_not_supported() {
        let part = part_type();
        let mut record = Record::item(Arc::clone(&part), 1, 1).unwrap();
        record
            .set_property("Weight", Some(Value::Double(1.5)))
            .unwrap();

        let query = ItemQuery::new(Arc::clone(&part)).with_condition(Condition::new(
            "Weight",
            ConditionOperator::Gt,
            Value::Double(1.0),
        ));
        let err = record.matches_item_query(&query).unwrap_err();
        assert!(matches!(err, ModelError::NotSupported { .. }));
    }

    #[test]
    fn missing_property_value_never_matches() {
        let part = part_type();
        let record = Record::item(Arc::clone(&part), 1, 1).unwrap();
        let query = ItemQuery::new(Arc::clone(&part)).with_condition(Condition::new(
            "Name",
            ConditionOperator::Eq,
            Value::String("Widget".into()),
        ));
        assert!(!record.matches_item_query(&query).unwrap());
    }

    #[test]
    fn relationship_matching_requires_both_halves() {
        let rel_type = Arc::new(
            ItemType::relationship("Uses").with_property("Role", PropertyKind::String),
        );
        let parent = Uuid::new_v4();
        let mut record =
            Record::relationship(Arc::clone(&rel_type), parent, 1, 1).unwrap();
        record
            .set_property("Role", Some(Value::String("primary".into())))
            .unwrap();

        let base = |value: &str| {
            ItemQuery::new(Arc::clone(&rel_type)).with_condition(Condition::new(
                "Role",
                ConditionOperator::Eq,
                Value::String(value.into()),
            ))
        };

        let both = RelationshipQuery::new(base("primary"), parent).unwrap();
        assert!(record.matches_relationship_query(&both).unwrap());

        // Wrong parent branch alone flips the result.
        let wrong_parent = RelationshipQuery::new(base("primary"), Uuid::new_v4()).unwrap();
        assert!(!record.matches_relationship_query(&wrong_parent).unwrap());

        // Wrong condition alone flips the result.
        let wrong_condition = RelationshipQuery::new(base("secondary"), parent).unwrap();
        assert!(!record.matches_relationship_query(&wrong_condition).unwrap());
    }
}
