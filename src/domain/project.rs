use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    ProjectId, Suite, SuiteId,
    record::{self, Record, RecordError, flag},
};

/// How a project organises its test cases into suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SuiteMode {
    /// All cases live in a single suite.
    SingleSuite = 1,
    /// A single suite plus baselines.
    SingleSuiteWithBaselines = 2,
    /// Cases are spread across multiple suites.
    MultipleSuites = 3,
}

impl TryFrom<u8> for SuiteMode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::SingleSuite),
            2 => Ok(Self::SingleSuiteWithBaselines),
            3 => Ok(Self::MultipleSuites),
            other => Err(format!("unknown suite mode {other}")),
        }
    }
}

impl From<SuiteMode> for u8 {
    fn from(mode: SuiteMode) -> Self {
        mode as Self
    }
}

/// A project: the top of the hierarchy.
///
/// Projects hold their suites by id, but the builder never populates this
/// map. Callers add suites explicitly with [`Project::insert_suite`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Unique project id.
    #[serde(rename = "id")]
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Web address of the project.
    #[serde(default)]
    pub url: String,
    /// Whether the project has been completed.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_completed: bool,
    /// When the project was completed, if it was.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub completed_on: Option<DateTime<Utc>>,
    /// How cases are organised into suites.
    pub suite_mode: SuiteMode,
    /// Whether the announcement is shown on the project overview.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub show_announcement: bool,
    /// Free-form announcement text.
    #[serde(default)]
    pub announcement: Option<String>,

    #[serde(skip)]
    suites: BTreeMap<SuiteId, Suite>,
}

impl Project {
    /// Decodes a project from its wire record.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing, a timestamp is not an
    /// integer, or the suite mode code is unknown.
    pub fn from_data(record: &Record) -> Result<Self, RecordError> {
        record::decode("project", record)
    }

    /// Adds a suite to the project, replacing any suite with the same id.
    ///
    /// Returns the replaced suite, if any.
    pub fn insert_suite(&mut self, suite: Suite) -> Option<Suite> {
        self.suites.insert(suite.suite_id, suite)
    }

    /// The suites added to this project, keyed by id.
    #[must_use]
    pub const fn suites(&self) -> &BTreeMap<SuiteId, Suite> {
        &self.suites
    }

    /// Looks up a suite by id.
    #[must_use]
    pub fn suite(&self, suite_id: SuiteId) -> Option<&Suite> {
        self.suites.get(&suite_id)
    }

    /// Looks up a suite by id for modification.
    pub fn suite_mut(&mut self, suite_id: SuiteId) -> Option<&mut Suite> {
        self.suites.get_mut(&suite_id)
    }
}
