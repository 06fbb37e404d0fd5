use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    CaseFieldId,
    record::{self, Record, RecordError},
};

/// The value type of a custom case field.
///
/// Code 11 is not assigned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CaseFieldType {
    /// Single-line text.
    String = 1,
    /// Integer number.
    Integer = 2,
    /// Multi-line text.
    Text = 3,
    /// Web address.
    Url = 4,
    /// Boolean checkbox.
    Checkbox = 5,
    /// One choice out of a fixed list.
    Dropdown = 6,
    /// Reference to a user.
    User = 7,
    /// Calendar date.
    Date = 8,
    /// Reference to a milestone.
    Milestone = 9,
    /// Structured test steps.
    Steps = 10,
    /// Several choices out of a fixed list.
    MultiSelect = 12,
}

impl TryFrom<u8> for CaseFieldType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Self::String,
            2 => Self::Integer,
            3 => Self::Text,
            4 => Self::Url,
            5 => Self::Checkbox,
            6 => Self::Dropdown,
            7 => Self::User,
            8 => Self::Date,
            9 => Self::Milestone,
            10 => Self::Steps,
            12 => Self::MultiSelect,
            other => return Err(format!("unknown case field type {other}")),
        })
    }
}

impl From<CaseFieldType> for u8 {
    fn from(kind: CaseFieldType) -> Self {
        kind as Self
    }
}

/// Definition of a custom case field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseField {
    /// Unique field id.
    #[serde(rename = "id")]
    pub case_field_id: CaseFieldId,
    /// Position in the case editor.
    pub display_order: i64,
    /// Label shown in the user interface.
    pub label: String,
    /// Field name without the `custom_` prefix.
    pub name: String,
    /// Field name as it appears on case records, e.g. `custom_uuid`.
    pub system_name: String,
    /// Value type of the field.
    #[serde(rename = "type_id")]
    pub field_type: CaseFieldType,
    /// Per-context configuration, passed through untouched.
    #[serde(default)]
    pub configs: Value,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

impl CaseField {
    /// Decodes a case field definition from its wire record.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or the type code is
    /// unknown.
    pub fn from_data(record: &Record) -> Result<Self, RecordError> {
        record::decode("case field", record)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    fn field_record(type_id: u8) -> Record {
        let value = json!({
            "id": 4,
            "display_order": 2,
            "label": "UUID",
            "name": "uuid",
            "system_name": "custom_uuid",
            "type_id": type_id,
            "configs": [{"context": {"is_global": true}}],
            "description": null,
        });
        match value {
            Value::Object(record) => record,
            _ => unreachable!(),
        }
    }

    #[test_case(1, CaseFieldType::String; "string")]
    #[test_case(10, CaseFieldType::Steps; "steps")]
    #[test_case(12, CaseFieldType::MultiSelect; "multi select")]
    fn decodes_field_type(code: u8, expected: CaseFieldType) {
        let field = CaseField::from_data(&field_record(code)).expect("record should decode");
        assert_eq!(field.field_type, expected);
        assert_eq!(field.system_name, "custom_uuid");
        assert!(field.configs.is_array());
    }

    #[test_case(0; "zero")]
    #[test_case(11; "unassigned code")]
    #[test_case(13; "past the last code")]
    fn rejects_unknown_field_type(code: u8) {
        let err = CaseField::from_data(&field_record(code)).unwrap_err();
        assert!(err.to_string().contains("unknown case field type"));
    }
}
