//! Domain records returned by the core-data service.
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as Json;

use acbridge_errors::RecordParseFailed;

/// Attribute names used by the core-data service for a kind of entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EntityFields {
    /// Core-data kind (object ID) of the entity records.
    pub kind: &'static str,

    /// Name of the attribute holding the entity ID.
    pub id: &'static str,

    /// Name of the attribute holding the entity display name.
    pub name: &'static str,

    /// Name of the attribute holding the owning account (tenant).
    pub owner: &'static str,
}

/// Minimal view of a domain entity needed to describe it for authorisation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: i64,
    pub name: String,
    pub owner_account: String,
}

impl EntityRecord {
    /// Parse a raw core-data record using the attribute names of its entity kind.
    ///
    /// The ID and name attributes are required.
    /// A missing owner account is treated as platform-wide (empty).
    pub fn parse(fields: &EntityFields, raw: &Json) -> Result<EntityRecord> {
        let id = lookup_id(fields.kind, raw, fields.id)?;
        let name = lookup_string(fields.kind, raw, fields.name)?;
        let owner_account = match raw.get(fields.owner) {
            None | Some(Json::Null) => String::new(),
            Some(_) => lookup_string(fields.kind, raw, fields.owner)?,
        };
        Ok(EntityRecord {
            id,
            name,
            owner_account,
        })
    }
}

/// Definition of the model classifying a family of entities.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: i64,
    pub object_id: String,
    pub object_name: String,
}

impl ModelRecord {
    /// Core-data kind of model records.
    pub const KIND: &'static str = "model";

    /// Name of the attribute holding the model family key.
    pub const FAMILY_FIELD: &'static str = "bk_obj_id";

    /// Parse a raw core-data model record.
    pub fn parse(raw: &Json) -> Result<ModelRecord> {
        let id = lookup_id(Self::KIND, raw, "id")?;
        let object_id = lookup_string(Self::KIND, raw, Self::FAMILY_FIELD)?;
        let object_name = lookup_string(Self::KIND, raw, "bk_obj_name")?;
        Ok(ModelRecord {
            id,
            object_id,
            object_name,
        })
    }
}

/// Extract an integer ID attribute, accepting JSON numbers and numeric strings.
fn lookup_id(kind: &str, raw: &Json, field: &str) -> Result<i64> {
    let value = raw.get(field).ok_or_else(|| {
        let reason = format!("attribute '{}' is missing", field);
        RecordParseFailed::new(kind, reason)
    })?;
    let id = match value {
        Json::Number(number) => number.as_i64(),
        Json::String(text) => text.parse::<i64>().ok(),
        _ => None,
    };
    match id {
        Some(id) => Ok(id),
        None => {
            let reason = format!("attribute '{}' is not an integer: {}", field, value);
            anyhow::bail!(RecordParseFailed::new(kind, reason))
        }
    }
}

/// Extract a string attribute.
fn lookup_string(kind: &str, raw: &Json, field: &str) -> Result<String> {
    match raw.get(field) {
        Some(Json::String(value)) => Ok(value.clone()),
        Some(value) => {
            let reason = format!("attribute '{}' is not a string: {}", field, value);
            anyhow::bail!(RecordParseFailed::new(kind, reason))
        }
        None => {
            let reason = format!("attribute '{}' is missing", field);
            anyhow::bail!(RecordParseFailed::new(kind, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use acbridge_errors::RecordParseFailed;

    use super::EntityFields;
    use super::EntityRecord;
    use super::ModelRecord;

    const FIELDS: EntityFields = EntityFields {
        kind: "plat",
        id: "bk_cloud_id",
        name: "bk_cloud_name",
        owner: "bk_supplier_account",
    };

    #[test]
    fn parse_entity() {
        let raw = json!({
            "bk_cloud_id": 3,
            "bk_cloud_name": "p3",
            "bk_supplier_account": "acme",
            "other": true,
        });
        let record = EntityRecord::parse(&FIELDS, &raw).unwrap();
        assert_eq!(
            record,
            EntityRecord {
                id: 3,
                name: "p3".into(),
                owner_account: "acme".into(),
            }
        );
    }

    #[test]
    fn parse_entity_numeric_string_id() {
        let raw = json!({"bk_cloud_id": "12", "bk_cloud_name": "p12"});
        let record = EntityRecord::parse(&FIELDS, &raw).unwrap();
        assert_eq!(record.id, 12);
        assert_eq!(record.owner_account, "");
    }

    #[test]
    fn parse_entity_missing_id() {
        let raw = json!({"bk_cloud_name": "p12"});
        let error = EntityRecord::parse(&FIELDS, &raw).unwrap_err();
        assert!(error.is::<RecordParseFailed>());
    }

    #[test]
    fn parse_entity_bad_name() {
        let raw = json!({"bk_cloud_id": 1, "bk_cloud_name": 42});
        let error = EntityRecord::parse(&FIELDS, &raw).unwrap_err();
        assert!(error.is::<RecordParseFailed>());
    }

    #[test]
    fn parse_model() {
        let raw = json!({"id": 9, "bk_obj_id": "plat", "bk_obj_name": "Cloud Area"});
        let model = ModelRecord::parse(&raw).unwrap();
        assert_eq!(
            model,
            ModelRecord {
                id: 9,
                object_id: "plat".into(),
                object_name: "Cloud Area".into(),
            }
        );
    }

    #[test]
    fn parse_model_float_id() {
        let raw = json!({"id": 9.5, "bk_obj_id": "plat", "bk_obj_name": "Cloud Area"});
        let error = ModelRecord::parse(&raw).unwrap_err();
        assert!(error.is::<RecordParseFailed>());
    }
}
