//! Part, part image and verification payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::models::timestamp;
use crate::models::user::UserRef;
use crate::status::{PartStatus, UnknownStatus};

/// Field name to value mapping used for scraped, enriched and corrected data.
pub type FieldMap = BTreeMap<String, Value>;

/// Decodes a stored data blob into a field mapping.
///
/// The service stores these either as JSON objects or as JSON-encoded
/// strings. Anything that is not an object after decoding yields `None`.
pub fn decode_field_map(value: &Value) -> Option<FieldMap> {
    match value {
        Value::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Object(map)) => Some(map.into_iter().collect()),
            Ok(_) | Err(_) => {
                log::debug!("decode_field_map: string payload is not a JSON object");
                None
            }
        },
        _ => None,
    }
}

/// An image attached to a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartImage {
    pub id: String,
    #[serde(alias = "image_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_id: Option<String>,
}

/// A part exactly as the service sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: String,
    #[serde(default)]
    pub code: String,
    pub status: String,
    #[serde(default)]
    pub scraped_data: Option<Value>,
    #[serde(default)]
    pub enriched_data: Option<Value>,
    #[serde(default)]
    pub enriched_corrected_data: Option<Value>,
    #[serde(default)]
    pub verified_by: Option<UserRef>,
    /// `None` when unverified, or when the service sent an unrecognizable
    /// timestamp.
    #[serde(default, with = "timestamp")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<PartImage>,
}

impl PartRecord {
    pub fn part_status(&self) -> Result<PartStatus, UnknownStatus> {
        self.status
            .parse()
            .map_err(|e: UnknownStatus| e.on(&self.id))
    }

    pub fn scraped(&self) -> Option<FieldMap> {
        self.scraped_data.as_ref().and_then(decode_field_map)
    }

    pub fn enriched(&self) -> Option<FieldMap> {
        self.enriched_data.as_ref().and_then(decode_field_map)
    }

    pub fn corrected(&self) -> Option<FieldMap> {
        self.enriched_corrected_data
            .as_ref()
            .and_then(decode_field_map)
    }
}

/// Body of the part verification request.
///
/// `enriched_corrected_data` is omitted when the reviewer changed nothing,
/// so stored enrichment is never overwritten by an unchanged submit. When
/// present it travels as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub is_verified: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "encode_json_string",
        deserialize_with = "decode_json_string"
    )]
    pub enriched_corrected_data: Option<FieldMap>,
}

fn encode_json_string<S>(value: &Option<FieldMap>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(map) => {
            let encoded = serde_json::to_string(map).map_err(serde::ser::Error::custom)?;
            serializer.serialize_some(&encoded)
        }
        None => serializer.serialize_none(),
    }
}

fn decode_json_string<'de, D>(deserializer: D) -> Result<Option<FieldMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode_field_map(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("enriched_corrected_data is not an object")),
    }
}
