//! Serde adapters that persist UUIDs as their hyphenated string form.
//!
//! `uuid::Uuid` serializes as bytes for non-human-readable formats, and the
//! BSON encoders disagree on which one they are. Pinning the representation
//! to a string keeps stored `_id`s, query filters and JSON output identical.

use serde::{Deserialize, Deserializer, Serializer, de::Error};
use uuid::Uuid;

pub mod uuid_string {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(D::Error::custom)
    }
}

pub mod option_uuid_string {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => serializer.serialize_some(&id.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Uuid>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| Uuid::parse_str(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

/// Parse client-supplied ids, returning the first one that is not a UUID.
pub fn parse_all(raw: &[String]) -> Result<Vec<Uuid>, String> {
    raw.iter()
        .map(|id| Uuid::parse_str(id.trim()).map_err(|_| id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, Bson, doc};
    use serde::Serialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        #[serde(rename = "_id", with = "uuid_string")]
        id: Uuid,
        #[serde(default, with = "option_uuid_string")]
        owner: Option<Uuid>,
    }

    #[test]
    fn test_stored_as_string_in_bson() {
        let id = Uuid::now_v7();
        let row = Row { id, owner: None };

        let document = bson::to_document(&row).unwrap();
        assert_eq!(document.get("_id"), Some(&Bson::String(id.to_string())));

        let raw = bson::to_vec(&row).unwrap();
        let back: bson::Document = bson::from_slice(&raw).unwrap();
        assert_eq!(back.get_str("_id").unwrap(), id.to_string());
    }

    #[test]
    fn test_reads_back_optional_reference() {
        let owner = Uuid::now_v7();
        let document = doc! { "_id": Uuid::nil().to_string(), "owner": owner.to_string() };
        let row: Row = bson::from_document(document).unwrap();
        assert_eq!(row.owner, Some(owner));
    }

    #[test]
    fn test_parse_all_reports_bad_id() {
        let good = Uuid::now_v7().to_string();
        assert_eq!(parse_all(&[good.clone()]).unwrap().len(), 1);
        assert_eq!(
            parse_all(&[good, "abc".to_string()]).unwrap_err(),
            "abc".to_string()
        );
    }
}
