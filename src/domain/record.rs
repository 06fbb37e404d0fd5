//! Conversion between raw wire records and typed entities.
//!
//! A record is the JSON object the remote service returns for a single
//! entity. Typed entities are decoded with [`decode`] and, where they are sent
//! back, encoded with [`encode`].

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

/// A raw JSON object describing one entity on the wire.
pub type Record = serde_json::Map<String, Value>;

/// A wire record could not be converted into an entity.
#[derive(Debug, Error)]
#[error("malformed {kind} record: {source}")]
pub struct RecordError {
    kind: &'static str,
    source: serde_json::Error,
}

impl RecordError {
    /// The kind of entity that failed to decode, e.g. `"case"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    kind: &'static str,
    record: &Record,
) -> Result<T, RecordError> {
    serde_json::from_value(Value::Object(record.clone()))
        .map_err(|source| RecordError { kind, source })
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Record {
    match serde_json::to_value(value).expect("entities always serialize to JSON") {
        Value::Object(record) => record,
        other => unreachable!("entities serialize to JSON objects, got {other}"),
    }
}

/// Serde adapter for flags the service reports either as booleans or as
/// `0`/`1`. Missing and `null` values read as `false`; flags are written back
/// as `0`/`1`.
pub(crate) mod flag {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // signature required by `serde(with)`
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Option::<Flag>::deserialize(deserializer)? {
            None | Some(Flag::Bool(false) | Flag::Int(0)) => Ok(false),
            Some(Flag::Bool(true) | Flag::Int(1)) => Ok(true),
            Some(Flag::Int(other)) => Err(D::Error::custom(format!(
                "invalid flag value {other}, expected 0 or 1"
            ))),
        }
    }
}
