//! The on-disk XML record format.
//!
//! One file per record. The root element is named by the record kind
//! (`Item`, `Relationship`, `File`) and carries the identity and
//! lifecycle fields as attributes; one empty `Property` child per
//! property carries `Name` and `Value` attributes, the value textual per
//! the declared kind. The `Superceded` attribute keeps its historic
//! spelling on the wire.
//!
//! ```text
//! <Item ItemType="Part" ItemID="..." BranchID="..." VersionID="..."
//!       Branched="1" Versioned="1" Superceded="-1">
//!   <Property Name="Name" Value="Widget"/>
//! </Item>
//! ```

use crate::error::{ModelError, ModelResult};
use crate::record::{Record, RecordKind};
use crate::schema::Catalog;
use crate::value::Value;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use uuid::Uuid;

const ELEM_ITEM: &[u8] = b"Item";
const ELEM_RELATIONSHIP: &[u8] = b"Relationship";
const ELEM_FILE: &[u8] = b"File";
const ELEM_PROPERTY: &[u8] = b"Property";

const ATTR_ITEM_TYPE: &[u8] = b"ItemType";
const ATTR_ITEM_ID: &[u8] = b"ItemID";
const ATTR_BRANCH_ID: &[u8] = b"BranchID";
const ATTR_VERSION_ID: &[u8] = b"VersionID";
const ATTR_BRANCHED: &[u8] = b"Branched";
const ATTR_VERSIONED: &[u8] = b"Versioned";
const ATTR_SUPERSEDED: &[u8] = b"Superceded";
const ATTR_PARENT_BRANCH_ID: &[u8] = b"ParentBranchID";
const ATTR_NAME: &[u8] = b"Name";
const ATTR_VALUE: &[u8] = b"Value";

fn xml_err(context: &str, err: impl std::fmt::Display) -> ModelError {
    ModelError::invalid_record(format!("{context}: {err}"))
}

/// Serializes a record into its XML file content.
pub fn serialize(record: &Record) -> ModelResult<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(|e| xml_err("write declaration", e))?;

    let root_name = match record.kind() {
        RecordKind::Item => "Item",
        RecordKind::Relationship { .. } => "Relationship",
        RecordKind::File => "File",
    };
    let mut root = BytesStart::new(root_name);
    root.push_attribute((
        "ItemType",
        record.item_type().name(),
    ));
    root.push_attribute(("ItemID", record.item_id().to_string().as_str()));
    root.push_attribute(("BranchID", record.branch_id().to_string().as_str()));
    root.push_attribute(("VersionID", record.version_id().to_string().as_str()));
    root.push_attribute(("Branched", record.branched().to_string().as_str()));
    root.push_attribute(("Versioned", record.versioned().to_string().as_str()));
    root.push_attribute(("Superceded", record.superseded().to_string().as_str()));
    if let RecordKind::Relationship { parent_branch_id } = record.kind() {
        root.push_attribute(("ParentBranchID", parent_branch_id.to_string().as_str()));
    }
    writer
        .write_event(Event::Start(root))
        .map_err(|e| xml_err("write root", e))?;

    for (name, value) in record.properties() {
        let mut property = BytesStart::new("Property");
        property.push_attribute(("Name", name));
        let text = value.map(Value::format).unwrap_or_default();
        property.push_attribute(("Value", text.as_str()));
        writer
            .write_event(Event::Empty(property))
            .map_err(|e| xml_err("write property", e))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(root_name)))
        .map_err(|e| xml_err("write root end", e))?;
    Ok(writer.into_inner())
}

struct RootAttributes {
    item_type: Option<String>,
    item_id: Option<Uuid>,
    branch_id: Option<Uuid>,
    version_id: Option<Uuid>,
    branched: Option<i64>,
    versioned: Option<i64>,
    superseded: Option<i64>,
    parent_branch_id: Option<Uuid>,
}

fn parse_uuid(name: &str, text: &str) -> ModelResult<Uuid> {
    Uuid::parse_str(text).map_err(|e| xml_err(name, e))
}

fn parse_i64(name: &str, text: &str) -> ModelResult<i64> {
    text.parse::<i64>().map_err(|e| xml_err(name, e))
}

fn read_root_attributes(start: &BytesStart<'_>) -> ModelResult<RootAttributes> {
    let mut attrs = RootAttributes {
        item_type: None,
        item_id: None,
        branch_id: None,
        version_id: None,
        branched: None,
        versioned: None,
        superseded: None,
        parent_branch_id: None,
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_err("root attribute", e))?;
        let text = attr
            .unescape_value()
            .map_err(|e| xml_err("root attribute value", e))?;
        match attr.key.as_ref() {
            ATTR_ITEM_TYPE => attrs.item_type = Some(text.into_owned()),
            ATTR_ITEM_ID => attrs.item_id = Some(parse_uuid("ItemID", &text)?),
            ATTR_BRANCH_ID => attrs.branch_id = Some(parse_uuid("BranchID", &text)?),
            ATTR_VERSION_ID => attrs.version_id = Some(parse_uuid("VersionID", &text)?),
            ATTR_BRANCHED => attrs.branched = Some(parse_i64("Branched", &text)?),
            ATTR_VERSIONED => attrs.versioned = Some(parse_i64("Versioned", &text)?),
            ATTR_SUPERSEDED => attrs.superseded = Some(parse_i64("Superceded", &text)?),
            ATTR_PARENT_BRANCH_ID => {
                attrs.parent_branch_id = Some(parse_uuid("ParentBranchID", &text)?);
            }
            _ => {}
        }
    }
    Ok(attrs)
}

fn require<T>(value: Option<T>, name: &str) -> ModelResult<T> {
    value.ok_or_else(|| ModelError::invalid_record(format!("missing attribute {name}")))
}

/// Deserializes a record from its XML file content.
///
/// Every type name is resolved through the catalog.
///
/// # Errors
///
/// Returns [`ModelError::UnknownItemType`] /
/// [`ModelError::UnknownPropertyType`] if a referenced name is not in
/// the catalog, [`ModelError::InvalidValue`] if a property value does
/// not parse per its declared kind, and [`ModelError::InvalidRecord`]
/// for malformed XML.
pub fn deserialize(bytes: &[u8], catalog: &Catalog) -> ModelResult<Record> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut record: Option<Record> = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                ELEM_ITEM | ELEM_RELATIONSHIP | ELEM_FILE if record.is_none() => {
                    record = Some(read_record(e, catalog)?);
                }
                ELEM_PROPERTY => {
                    let record = record.as_mut().ok_or_else(|| {
                        ModelError::invalid_record("Property element before record root")
                    })?;
                    read_property(e, record)?;
                }
                other => {
                    return Err(ModelError::invalid_record(format!(
                        "unexpected element {}",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Ok(Event::End(_)) | Ok(Event::Decl(_)) | Ok(Event::Text(_)) => {}
            Ok(Event::Eof) => break,
            Ok(other) => {
                return Err(ModelError::invalid_record(format!(
                    "unexpected event {other:?}"
                )));
            }
            Err(e) => return Err(xml_err("read", e)),
        }
        buf.clear();
    }

    record.ok_or_else(|| ModelError::invalid_record("no record root element"))
}

fn read_record(start: &BytesStart<'_>, catalog: &Catalog) -> ModelResult<Record> {
    let attrs = read_root_attributes(start)?;
    let type_name = require(attrs.item_type, "ItemType")?;
    let item_type = catalog.resolve(&type_name)?;

    let kind = match start.name().as_ref() {
        ELEM_ITEM => RecordKind::Item,
        ELEM_FILE => RecordKind::File,
        ELEM_RELATIONSHIP => RecordKind::Relationship {
            parent_branch_id: require(attrs.parent_branch_id, "ParentBranchID")?,
        },
        // Caller only dispatches the three kinds here.
        other => {
            return Err(ModelError::invalid_record(format!(
                "unexpected root element {}",
                String::from_utf8_lossy(other)
            )));
        }
    };

    let record = Record::new(
        item_type,
        kind,
        require(attrs.item_id, "ItemID")?,
        require(attrs.branch_id, "BranchID")?,
        require(attrs.version_id, "VersionID")?,
        require(attrs.branched, "Branched")?,
        require(attrs.versioned, "Versioned")?,
    )?;
    record.restore_superseded(require(attrs.superseded, "Superceded")?);
    Ok(record)
}

fn read_property(start: &BytesStart<'_>, record: &mut Record) -> ModelResult<()> {
    let mut name: Option<String> = None;
    let mut text: Option<String> = None;
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_err("property attribute", e))?;
        let value = attr
            .unescape_value()
            .map_err(|e| xml_err("property attribute value", e))?;
        match attr.key.as_ref() {
            ATTR_NAME => name = Some(value.into_owned()),
            ATTR_VALUE => text = Some(value.into_owned()),
            _ => {}
        }
    }
    let name = require(name, "Property Name")?;
    let text = require(text, "Property Value")?;

    let property = record.item_type().require_property(&name)?.clone();
    let value = Value::parse(property.kind(), &name, &text)?;
    record.set_property(&name, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ItemType, PropertyKind};
    use crate::value::DATETIME_FORMAT;
    use chrono::NaiveDateTime;

    fn catalog() -> Catalog {
        let catalog = Catalog::new();
        catalog.register(
            ItemType::item("Part")
                .with_property("Name", PropertyKind::String)
                .with_property("Weight", PropertyKind::Double)
                .with_property("Released", PropertyKind::Boolean)
                .with_property("Created", PropertyKind::DateTime)
                .with_property("Owner", PropertyKind::Item)
                .with_property("State", PropertyKind::List),
        );
        catalog.register(ItemType::relationship("Uses"));
        catalog.register(ItemType::file("Drawing"));
        catalog
    }

    fn sample_item(catalog: &Catalog) -> Record {
        let part = catalog.get("Part").unwrap();
        let mut record = Record::item(part, 10, 11).unwrap();
        record
            .set_property("Name", Some(Value::String("Widget <A&B>".into())))
            .unwrap();
        record
            .set_property("Weight", Some(Value::Double(2.5)))
            .unwrap();
        record
            .set_property("Released", Some(Value::Boolean(true)))
            .unwrap();
        let created = NaiveDateTime::parse_from_str("2015-06-03T14:30:05.421", DATETIME_FORMAT)
            .unwrap()
            .and_utc();
        record
            .set_property("Created", Some(Value::DateTime(created)))
            .unwrap();
        record
            .set_property("Owner", Some(Value::ItemRef(Uuid::new_v4())))
            .unwrap();
        record.set_property("State", None).unwrap();
        record
    }

    #[test]
    fn item_round_trip() {
        let catalog = catalog();
        let record = sample_item(&catalog);
        record.set_superseded(99);

        let bytes = serialize(&record).unwrap();
        let restored = deserialize(&bytes, &catalog).unwrap();

        assert_eq!(restored.item_type().name(), "Part");
        assert_eq!(restored.kind(), RecordKind::Item);
        assert_eq!(restored.item_id(), record.item_id());
        assert_eq!(restored.branch_id(), record.branch_id());
        assert_eq!(restored.version_id(), record.version_id());
        assert_eq!(restored.branched(), 10);
        assert_eq!(restored.versioned(), 11);
        assert_eq!(restored.superseded(), 99);
        assert_eq!(
            restored.property("Name").unwrap(),
            Some(&Value::String("Widget <A&B>".into()))
        );
        // Null round-trips to "no value".
        assert_eq!(restored.property("State").unwrap(), None);
    }

    #[test]
    fn serialization_is_stable() {
        let catalog = catalog();
        let record = sample_item(&catalog);

        let first = serialize(&record).unwrap();
        let restored = deserialize(&first, &catalog).unwrap();
        let second = serialize(&restored).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn relationship_round_trip_keeps_parent_branch() {
        let catalog = catalog();
        let uses = catalog.get("Uses").unwrap();
        let parent = Uuid::new_v4();
        let record = Record::relationship(uses, parent, 1, 2).unwrap();

        let bytes = serialize(&record).unwrap();
        let restored = deserialize(&bytes, &catalog).unwrap();
        assert_eq!(restored.parent_branch_id(), Some(parent));
    }

    #[test]
    fn unknown_item_type_fails() {
        let catalog = catalog();
        let record = sample_item(&catalog);
        let bytes = serialize(&record).unwrap();

        let empty = Catalog::new();
        let err = deserialize(&bytes, &empty).unwrap_err();
        assert!(matches!(err, ModelError::UnknownItemType { .. }));
    }

    #[test]
    fn unknown_property_fails() {
        let catalog = catalog();
        let record = sample_item(&catalog);
        let bytes = serialize(&record).unwrap();

        // A catalog whose Part type lost its properties.
        let stripped = Catalog::new();
        stripped.register(ItemType::item("Part"));
        let err = deserialize(&bytes, &stripped).unwrap_err();
        assert!(matches!(err, ModelError::UnknownPropertyType { .. }));
    }

    #[test]
    fn unparseable_value_fails() {
        let catalog = catalog();
        let id = Uuid::new_v4();
        let xml = format!(
            "<Item ItemType=\"Part\" ItemID=\"{id}\" BranchID=\"{id}\" VersionID=\"{id}\" \
             Branched=\"0\" Versioned=\"0\" Superceded=\"-1\">\
             <Property Name=\"Weight\" Value=\"heavy\"/></Item>"
        );
        let err = deserialize(xml.as_bytes(), &catalog).unwrap_err();
        assert!(matches!(err, ModelError::InvalidValue { .. }));
    }

    #[test]
    fn missing_attribute_fails() {
        let catalog = catalog();
        let xml = b"<Item ItemType=\"Part\"/>";
        let err = deserialize(xml, &catalog).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRecord { .. }));
    }
}
