use serde::Deserialize;

use crate::domain::{
    CaseTypeId,
    record::{self, Record, RecordError, flag},
};

/// A case type, e.g. "Functional" or "Regression".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseType {
    /// Unique case type id.
    #[serde(rename = "id")]
    pub case_type_id: CaseTypeId,
    /// Whether new cases get this type by default.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_default: bool,
    /// Display name.
    pub name: String,
}

impl CaseType {
    /// Decodes a case type from its wire record.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or has the wrong type.
    pub fn from_data(record: &Record) -> Result<Self, RecordError> {
        record::decode("case type", record)
    }
}
