use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    CaseId, SectionId, SuiteId,
    record::{self, Record, RecordError, flag},
};

/// Prefix the service puts in front of every custom case field key.
pub const CUSTOM_PREFIX: &str = "custom_";

/// A test case.
///
/// The public fields mirror the remote record. Custom fields keep their
/// `custom_`-prefixed keys and are read with [`Case::get_custom`]. The link
/// state (owning suite and section) is managed by the [`Suite`] that holds
/// the case.
///
/// [`Suite`]: crate::domain::Suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CaseRecord", into = "CaseRecord")]
pub struct Case {
    /// Unique case id.
    pub case_id: CaseId,
    /// Id of the suite the case belongs to.
    pub suite_id: SuiteId,
    /// Id of the section holding the case, if any.
    pub section_id: Option<SectionId>,
    /// Case title.
    pub title: String,
    /// User who created the case.
    pub created_by: u64,
    /// Creation time.
    pub created_on: DateTime<Utc>,
    /// User who last updated the case.
    pub updated_by: u64,
    /// Time of the last update.
    pub updated_on: DateTime<Utc>,
    /// Priority id.
    pub priority_id: u64,
    /// Template id.
    pub template_id: u64,
    /// Case type id.
    pub type_id: u64,
    /// Milestone the case is attached to.
    pub milestone_id: Option<u64>,
    /// Position among the cases of its section.
    pub display_order: Option<i64>,
    /// Estimated duration, e.g. `"30s"`.
    pub estimate: Option<String>,
    /// Forecast duration computed by the service.
    pub estimate_forecast: Option<String>,
    /// Comma-separated references.
    pub refs: Option<String>,
    /// Whether the case has been soft-deleted.
    pub is_deleted: bool,
    /// Custom field values keyed by their full `custom_` key.
    pub custom_fields: BTreeMap<String, Value>,

    pub(crate) links: CaseLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CaseLinks {
    pub suite: Option<SuiteId>,
    pub section: Option<SectionId>,
}

/// A custom field could not be read from a case.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CustomFieldError {
    /// The field name was empty.
    #[error("custom field name must be non-empty")]
    EmptyName,
    /// The case has no value for the field. Holds the full key.
    #[error("case has no custom field: '{0}'")]
    NotFound(String),
}

impl Case {
    /// Decodes a case from its wire record. The result is unlinked.
    ///
    /// Keys starting with `custom_` are collected into
    /// [`Case::custom_fields`]; any other unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or has the wrong type.
    pub fn from_data(record: &Record) -> Result<Self, RecordError> {
        record::decode("case", record)
    }

    /// Encodes the case back into its wire record.
    ///
    /// This is the inverse of [`Case::from_data`]: timestamps become unix
    /// seconds, the deleted flag becomes `0`/`1` and custom fields are written
    /// back under their own keys.
    #[must_use]
    pub fn to_dict(&self) -> Record {
        record::encode(self)
    }

    /// Reads the custom field `custom_<name>`.
    ///
    /// # Errors
    ///
    /// Returns [`CustomFieldError::EmptyName`] for an empty name and
    /// [`CustomFieldError::NotFound`] if the case has no such field.
    pub fn get_custom(&self, name: &str) -> Result<&Value, CustomFieldError> {
        if name.is_empty() {
            return Err(CustomFieldError::EmptyName);
        }
        let key = format!("{CUSTOM_PREFIX}{name}");
        self.custom_fields
            .get(&key)
            .ok_or(CustomFieldError::NotFound(key))
    }

    /// The suite this case is linked into.
    #[must_use]
    pub const fn suite(&self) -> Option<SuiteId> {
        self.links.suite
    }

    /// The section this case is linked to.
    #[must_use]
    pub const fn section(&self) -> Option<SectionId> {
        self.links.section
    }

    /// Whether the case is currently linked into a suite.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.links.suite.is_some()
    }
}

/// The wire shape of a case.
#[derive(Serialize, Deserialize)]
struct CaseRecord {
    id: CaseId,
    suite_id: SuiteId,
    created_by: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    created_on: DateTime<Utc>,
    priority_id: u64,
    template_id: u64,
    title: String,
    type_id: u64,
    updated_by: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    updated_on: DateTime<Utc>,
    #[serde(default, with = "flag")]
    is_deleted: bool,
    #[serde(default)]
    display_order: Option<i64>,
    #[serde(default)]
    estimate: Option<String>,
    #[serde(default)]
    estimate_forecast: Option<String>,
    #[serde(default)]
    section_id: Option<SectionId>,
    #[serde(default)]
    milestone_id: Option<u64>,
    #[serde(default)]
    refs: Option<String>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl From<CaseRecord> for Case {
    fn from(record: CaseRecord) -> Self {
        let custom_fields = record
            .extra
            .into_iter()
            .filter(|(key, _)| key.starts_with(CUSTOM_PREFIX))
            .collect();
        Self {
            case_id: record.id,
            suite_id: record.suite_id,
            section_id: record.section_id,
            title: record.title,
            created_by: record.created_by,
            created_on: record.created_on,
            updated_by: record.updated_by,
            updated_on: record.updated_on,
            priority_id: record.priority_id,
            template_id: record.template_id,
            type_id: record.type_id,
            milestone_id: record.milestone_id,
            display_order: record.display_order,
            estimate: record.estimate,
            estimate_forecast: record.estimate_forecast,
            refs: record.refs,
            is_deleted: record.is_deleted,
            custom_fields,
            links: CaseLinks::default(),
        }
    }
}

impl From<Case> for CaseRecord {
    fn from(case: Case) -> Self {
        Self {
            id: case.case_id,
            suite_id: case.suite_id,
            created_by: case.created_by,
            created_on: case.created_on,
            priority_id: case.priority_id,
            template_id: case.template_id,
            title: case.title,
            type_id: case.type_id,
            updated_by: case.updated_by,
            updated_on: case.updated_on,
            is_deleted: case.is_deleted,
            display_order: case.display_order,
            estimate: case.estimate,
            estimate_forecast: case.estimate_forecast,
            section_id: case.section_id,
            milestone_id: case.milestone_id,
            refs: case.refs,
            extra: case.custom_fields,
        }
    }
}
