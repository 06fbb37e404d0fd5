use chrono::{DateTime, Utc};

use crate::domain::{CaseId, ProjectId, Record, SectionId, SuiteId};

/// The fields of a section to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    /// Suite to create the section in. Required unless the project runs in
    /// single-suite mode.
    pub suite_id: Option<SuiteId>,
    /// Name of the new section.
    pub name: String,
    /// Parent section, or `None` for a root section.
    pub parent_id: Option<SectionId>,
    /// Optional description.
    pub description: Option<String>,
}

/// Narrows down the cases returned by [`Client::get_cases`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    /// Only cases of this suite.
    pub suite_id: Option<SuiteId>,
    /// Only cases directly in this section.
    pub section_id: Option<SectionId>,
    /// Only cases whose title contains this text.
    pub filter: Option<String>,
    /// Only cases updated at or after this time.
    pub updated_after: Option<DateTime<Utc>>,
}

impl CaseFilter {
    /// Every case of a suite.
    #[must_use]
    pub fn for_suite(suite_id: SuiteId) -> Self {
        Self {
            suite_id: Some(suite_id),
            ..Self::default()
        }
    }
}

/// The record-level collaborator that talks to the remote service.
///
/// Implementations send the request and hand back the raw JSON records. They
/// are not expected to retry, count or convert anything; the
/// [`Adapter`](crate::remote::Adapter) does that on top.
pub trait Client {
    /// The error the transport reports.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches one project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_project(&self, project_id: ProjectId) -> Result<Record, Self::Error>;

    /// Fetches up to `limit` projects starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_projects(
        &self,
        is_completed: Option<bool>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Record>, Self::Error>;

    /// Fetches one suite.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_suite(&self, suite_id: SuiteId) -> Result<Record, Self::Error>;

    /// Fetches every suite of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_suites(&self, project_id: ProjectId) -> Result<Vec<Record>, Self::Error>;

    /// Fetches one section.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_section(&self, section_id: SectionId) -> Result<Record, Self::Error>;

    /// Fetches up to `limit` sections of a project starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_sections(
        &self,
        project_id: ProjectId,
        suite_id: Option<SuiteId>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Record>, Self::Error>;

    /// Creates a section and returns its record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn add_section(&self, project_id: ProjectId, section: &NewSection)
    -> Result<Record, Self::Error>;

    /// Moves a section, with its subtree, under a new parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn move_section(
        &self,
        section_id: SectionId,
        parent_id: Option<SectionId>,
    ) -> Result<Record, Self::Error>;

    /// Deletes a section. With `soft` set, the service only flags it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn delete_section(&self, section_id: SectionId, soft: bool) -> Result<(), Self::Error>;

    /// Fetches one case.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_case(&self, case_id: CaseId) -> Result<Record, Self::Error>;

    /// Fetches up to `limit` cases of a project starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_cases(
        &self,
        project_id: ProjectId,
        filter: &CaseFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Record>, Self::Error>;

    /// Creates a case in a section and returns its record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn add_case(
        &self,
        section_id: SectionId,
        title: &str,
        fields: &Record,
    ) -> Result<Record, Self::Error>;

    /// Updates the given fields of a case and returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn update_case(&self, case_id: CaseId, fields: &Record) -> Result<Record, Self::Error>;

    /// Deletes a case. With `soft` set, the service only flags it.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn delete_case(&self, case_id: CaseId, soft: bool) -> Result<(), Self::Error>;

    /// Fetches the custom case field definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_case_fields(&self) -> Result<Vec<Record>, Self::Error>;

    /// Fetches the case types.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    fn get_case_types(&self) -> Result<Vec<Record>, Self::Error>;
}
