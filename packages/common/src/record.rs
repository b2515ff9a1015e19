//! Livestock record model shared by the server and the dashboard.
//!
//! Records are loosely typed documents: `meta` may be missing or hold
//! something other than a mapping, and `data` is a heterogeneous list of
//! attachment descriptors. The typed views here ([`Metadata`],
//! [`Attachment`]) never fail on odd shapes; they degrade instead.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Sentinel used for absent string metadata fields.
pub const UNKNOWN: &str = "Unknown";

/// Message placed in `meta` when a record carries no usable metadata.
pub const NO_METADATA_MESSAGE: &str = "No metadata available";

/// Attachment `type` tag for a reference into the blob store.
pub const BLOB_ATTACHMENT_TYPE: &str = "blob";

/// Tag written by older ingestion tools for the same kind of attachment.
pub const LEGACY_BLOB_ATTACHMENT_TYPE: &str = "gridfs";

/// Single-key wrappers that carry an identifier in extended-JSON documents.
const ID_WRAPPER_KEYS: &[&str] = &["$oid", "$uuid"];

/// A stored livestock record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the record store, always in string form.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub barcode: String,
    /// `None` when the key is absent. An explicit `null` is kept as
    /// `Some(Value::Null)` so documents round-trip unchanged.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    /// Any other top-level fields of a raw-inserted document.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Only called for keys that are present, so `null` stays a value.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document must be a JSON object")]
    NotAnObject,
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl Record {
    pub fn new(barcode: impl Into<String>, meta: Value, data: Vec<Attachment>) -> Self {
        Self {
            id: None,
            barcode: barcode.into(),
            meta: Some(meta),
            data: Some(Value::Array(data.iter().map(Attachment::to_value).collect())),
            extra: Map::new(),
        }
    }

    /// Parse an externally prepared document.
    ///
    /// Extended-JSON id wrappers are flattened first. A caller-supplied `_id`
    /// is discarded: identifiers are assigned by the record store.
    pub fn from_document(document: Value) -> Result<Self, DocumentError> {
        let mut document = normalize_ids(document);
        let Value::Object(map) = &mut document else {
            return Err(DocumentError::NotAnObject);
        };
        map.remove("_id");
        Ok(serde_json::from_value(document)?)
    }

    /// Serialize back into a plain JSON document.
    pub fn to_document(&self) -> Value {
        // Serializing a struct of strings and JSON values cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Whether `meta` holds a mapping.
    pub fn has_metadata(&self) -> bool {
        matches!(self.meta, Some(Value::Object(_)))
    }

    /// Replace a missing or non-mapping `meta` with the placeholder mapping,
    /// so readers always see a `meta` key.
    pub fn fill_missing_meta(&mut self) {
        if !self.has_metadata() {
            self.meta = Some(json!({ "message": NO_METADATA_MESSAGE }));
        }
    }

    /// Typed view over `meta`, or `None` when it is absent or not a mapping.
    pub fn metadata(&self) -> Option<Metadata> {
        self.meta.as_ref().and_then(Metadata::from_value)
    }

    /// Typed view over `data`, or `None` when it is absent or not a sequence.
    pub fn attachments(&self) -> Option<Vec<Attachment>> {
        match &self.data {
            Some(Value::Array(items)) => Some(items.iter().map(Attachment::from_value).collect()),
            _ => None,
        }
    }
}

/// Metadata fields observed on records. Every field is optional; the
/// accessors apply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub cow_id: Option<String>,
    pub birth_date: Option<String>,
    pub breed: Option<String>,
    pub weight: Option<i64>,
    pub timestamp: Option<String>,
}

impl Metadata {
    /// Lenient read of a `meta` value. Numbers are accepted where strings are
    /// expected and numeric strings where `weight` is expected; anything else
    /// falls back to the field default.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            cow_id: text_field(map, "cow_id"),
            birth_date: text_field(map, "birth_date"),
            breed: text_field(map, "breed"),
            weight: map.get("weight").and_then(|w| match w {
                Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }),
            timestamp: text_field(map, "timestamp"),
        })
    }

    pub fn cow_id(&self) -> &str {
        self.cow_id.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn birth_date(&self) -> &str {
        self.birth_date.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn breed(&self) -> &str {
        self.breed.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn weight(&self) -> i64 {
        self.weight.unwrap_or(0)
    }

    pub fn timestamp(&self) -> &str {
        self.timestamp.as_deref().unwrap_or(UNKNOWN)
    }

    /// Mapping with every default applied, as written by the form path.
    pub fn to_value(&self) -> Value {
        json!({
            "cow_id": self.cow_id(),
            "birth_date": self.birth_date(),
            "breed": self.breed(),
            "weight": self.weight(),
            "timestamp": self.timestamp(),
        })
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One entry of a record's `data` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Attachment {
    /// Reference to a binary object in the blob store. `file_id` is `None`
    /// when the entry is tagged as a blob but carries no id.
    Blob {
        file_id: Option<String>,
        description: Option<String>,
    },
    /// Any other entry, kept as-is.
    Other(Value),
}

impl Attachment {
    pub fn blob(file_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Blob {
            file_id: Some(file_id.into()),
            description: Some(description.into()),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        let tag = value.get("type").and_then(Value::as_str);
        if !matches!(tag, Some(BLOB_ATTACHMENT_TYPE | LEGACY_BLOB_ATTACHMENT_TYPE)) {
            return Self::Other(value.clone());
        }
        let file_id = match value.get("file_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Self::Blob {
            file_id,
            description: value
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Blob {
                file_id,
                description,
            } => {
                let mut map = Map::new();
                map.insert("type".into(), BLOB_ATTACHMENT_TYPE.into());
                if let Some(id) = file_id {
                    map.insert("file_id".into(), id.clone().into());
                }
                if let Some(desc) = description {
                    map.insert("description".into(), desc.clone().into());
                }
                Value::Object(map)
            }
            Self::Other(value) => value.clone(),
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Self::Blob { .. })
    }
}

impl From<Value> for Attachment {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl From<Attachment> for Value {
    fn from(attachment: Attachment) -> Self {
        attachment.to_value()
    }
}

/// Rebuild `value` bottom-up, passing every node through `f` after its
/// children have been mapped.
pub fn map_values<F>(value: Value, f: &F) -> Value
where
    F: Fn(Value) -> Value,
{
    let mapped = match value {
        Value::Array(items) => Value::Array(items.into_iter().map(|v| map_values(v, f)).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, map_values(v, f)))
                .collect(),
        ),
        leaf => leaf,
    };
    f(mapped)
}

/// Replace extended-JSON id wrappers (`{"$oid": "..."}`, `{"$uuid": "..."}`)
/// with their plain string at any depth.
pub fn normalize_ids(value: Value) -> Value {
    map_values(value, &|node| match node {
        Value::Object(map) if map.len() == 1 => {
            let unwrapped = map.iter().next().and_then(|(key, inner)| match inner {
                Value::String(id) if ID_WRAPPER_KEYS.contains(&key.as_str()) => Some(id.clone()),
                _ => None,
            });
            match unwrapped {
                Some(id) => Value::String(id),
                None => Value::Object(map),
            }
        }
        other => other,
    })
}
