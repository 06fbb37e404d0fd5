use std::num::NonZeroUsize;

use tracing::debug;

use crate::{
    domain::{
        Case, CaseField, CaseId, CaseType, Detached, Project, ProjectId, Record, RecordError,
        Section, SectionId, Suite, SuiteId,
    },
    remote::{CaseFilter, Client, Error, NewSection, Pages, Request, RequestStats},
};

/// Typed access to the remote service.
///
/// Every method issues at most one request per call (paginated listings issue
/// one per page), counts it in the adapter's [`RequestStats`] and decodes the
/// returned records. Mutating requests that have a local counterpart also
/// apply it to the [`Suite`] passed in, after the remote call succeeded.
#[derive(Debug)]
pub struct Adapter<C> {
    client: C,
    stats: RequestStats,
}

impl<C: Client> Adapter<C> {
    /// Wraps a client, counting its requests in [`RequestStats::shared`].
    pub fn new(client: C) -> Self {
        Self::with_stats(client, RequestStats::shared())
    }

    /// Wraps a client, counting its requests in `stats`.
    pub const fn with_stats(client: C, stats: RequestStats) -> Self {
        Self { client, stats }
    }

    /// The wrapped client.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The request counters of this adapter.
    pub const fn stats(&self) -> &RequestStats {
        &self.stats
    }

    fn send<T>(
        &self,
        request: Request,
        call: impl FnOnce(&C) -> Result<T, C::Error>,
    ) -> Result<T, Error<C::Error>> {
        self.stats.increment(request);
        debug!(%request, "sending request");
        call(&self.client).map_err(Error::Client)
    }

    /// Fetches one project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record is malformed.
    pub fn get_project(&self, project_id: ProjectId) -> Result<Project, Error<C::Error>> {
        let record = self.send(Request::GetProject, |c| c.get_project(project_id))?;
        Ok(Project::from_data(&record)?)
    }

    /// Lists projects, optionally only completed or only active ones.
    ///
    /// Pages are requested as the iterator is consumed.
    pub fn get_projects(
        &self,
        is_completed: Option<bool>,
        page_size: NonZeroUsize,
    ) -> Pages<
        impl FnMut(usize, usize) -> Result<Vec<Record>, Error<C::Error>> + '_,
        Project,
        C::Error,
    > {
        Pages::new(
            move |limit, offset| {
                self.send(Request::GetProjects, |c| {
                    c.get_projects(is_completed, limit, offset)
                })
            },
            Project::from_data,
            page_size,
        )
    }

    /// Fetches one suite. The returned suite holds no sections or cases.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record is malformed.
    pub fn get_suite(&self, suite_id: SuiteId) -> Result<Suite, Error<C::Error>> {
        let record = self.send(Request::GetSuite, |c| c.get_suite(suite_id))?;
        Ok(Suite::from_data(&record)?)
    }

    /// Fetches every suite of a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a record is malformed.
    pub fn get_suites(&self, project_id: ProjectId) -> Result<Vec<Suite>, Error<C::Error>> {
        let records = self.send(Request::GetSuites, |c| c.get_suites(project_id))?;
        Ok(decode_all(&records, Suite::from_data)?)
    }

    /// Fetches one section. The returned section is unlinked.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record is malformed.
    pub fn get_section(&self, section_id: SectionId) -> Result<Section, Error<C::Error>> {
        let record = self.send(Request::GetSection, |c| c.get_section(section_id))?;
        Ok(Section::from_data(&record)?)
    }

    /// Lists the sections of a project, optionally of one suite only.
    ///
    /// Pages are requested as the iterator is consumed.
    pub fn get_sections(
        &self,
        project_id: ProjectId,
        suite_id: Option<SuiteId>,
        page_size: NonZeroUsize,
    ) -> Pages<
        impl FnMut(usize, usize) -> Result<Vec<Record>, Error<C::Error>> + '_,
        Section,
        C::Error,
    > {
        Pages::new(
            move |limit, offset| {
                self.send(Request::GetSections, |c| {
                    c.get_sections(project_id, suite_id, limit, offset)
                })
            },
            Section::from_data,
            page_size,
        )
    }

    /// Creates a section. The returned section is unlinked.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record is malformed.
    pub fn add_section(
        &self,
        project_id: ProjectId,
        section: &NewSection,
    ) -> Result<Section, Error<C::Error>> {
        let record = self.send(Request::AddSection, |c| c.add_section(project_id, section))?;
        Ok(Section::from_data(&record)?)
    }

    /// Moves a section under `new_parent`, remotely and then in `suite`.
    ///
    /// The move is checked against `suite` before the request is sent. The
    /// service keeps the section's subtree, while the local move relinks the
    /// section on its own and returns the descendants and cases it dropped.
    ///
    /// # Errors
    ///
    /// Returns an error, without sending a request, if either section is not
    /// in the suite or the move would create a cycle. Returns an error without
    /// changing the suite if the request fails.
    pub fn move_section(
        &self,
        suite: &mut Suite,
        section_id: SectionId,
        new_parent: Option<SectionId>,
    ) -> Result<Detached, Error<C::Error>> {
        suite.check_move(section_id, new_parent)?;
        self.send(Request::MoveSection, |c| {
            c.move_section(section_id, new_parent)
        })?;
        Ok(suite.move_section(section_id, new_parent)?)
    }

    /// Deletes a section remotely.
    ///
    /// Unless `soft` is set, the section and its subtree are then unlinked
    /// from `suite` and returned.
    ///
    /// # Errors
    ///
    /// Returns an error without changing the suite if the request fails.
    pub fn delete_section(
        &self,
        suite: &mut Suite,
        section_id: SectionId,
        soft: bool,
    ) -> Result<Option<Detached>, Error<C::Error>> {
        self.send(Request::DeleteSection, |c| {
            c.delete_section(section_id, soft)
        })?;
        if soft {
            return Ok(None);
        }
        Ok(suite.unlink_section(section_id))
    }

    /// Fetches one case. The returned case is unlinked.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record is malformed.
    pub fn get_case(&self, case_id: CaseId) -> Result<Case, Error<C::Error>> {
        let record = self.send(Request::GetCase, |c| c.get_case(case_id))?;
        Ok(Case::from_data(&record)?)
    }

    /// Lists the cases of a project matching `filter`.
    ///
    /// Pages are requested as the iterator is consumed.
    pub fn get_cases(
        &self,
        project_id: ProjectId,
        filter: CaseFilter,
        page_size: NonZeroUsize,
    ) -> Pages<
        impl FnMut(usize, usize) -> Result<Vec<Record>, Error<C::Error>> + '_,
        Case,
        C::Error,
    > {
        Pages::new(
            move |limit, offset| {
                self.send(Request::GetCases, |c| {
                    c.get_cases(project_id, &filter, limit, offset)
                })
            },
            Case::from_data,
            page_size,
        )
    }

    /// Creates a case in a section. The returned case is unlinked.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record is malformed.
    pub fn add_case(
        &self,
        section_id: SectionId,
        title: &str,
        fields: &Record,
    ) -> Result<Case, Error<C::Error>> {
        let record = self.send(Request::AddCase, |c| c.add_case(section_id, title, fields))?;
        Ok(Case::from_data(&record)?)
    }

    /// Updates a case and returns the updated, unlinked case.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the record is malformed.
    pub fn update_case(&self, case_id: CaseId, fields: &Record) -> Result<Case, Error<C::Error>> {
        let record = self.send(Request::UpdateCase, |c| c.update_case(case_id, fields))?;
        Ok(Case::from_data(&record)?)
    }

    /// Deletes a case remotely.
    ///
    /// Unless `soft` is set, the case is then unlinked from `suite` and
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error without changing the suite if the request fails.
    pub fn delete_case(
        &self,
        suite: &mut Suite,
        case_id: CaseId,
        soft: bool,
    ) -> Result<Option<Case>, Error<C::Error>> {
        self.send(Request::DeleteCase, |c| c.delete_case(case_id, soft))?;
        if soft {
            return Ok(None);
        }
        Ok(suite.unlink_case(case_id))
    }

    /// Fetches the custom case field definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a record is malformed.
    pub fn get_case_fields(&self) -> Result<Vec<CaseField>, Error<C::Error>> {
        let records = self.send(Request::GetCaseFields, |c| c.get_case_fields())?;
        Ok(decode_all(&records, CaseField::from_data)?)
    }

    /// Fetches the case types.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a record is malformed.
    pub fn get_case_types(&self) -> Result<Vec<CaseType>, Error<C::Error>> {
        let records = self.send(Request::GetCaseTypes, |c| c.get_case_types())?;
        Ok(decode_all(&records, CaseType::from_data)?)
    }
}

fn decode_all<T>(
    records: &[Record],
    decode: fn(&Record) -> Result<T, RecordError>,
) -> Result<Vec<T>, RecordError> {
    records.iter().map(decode).collect()
}
