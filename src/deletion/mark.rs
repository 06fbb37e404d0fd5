use non_empty_string::NonEmptyString;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    builder::Builder,
    deletion::{Bulk, Deletion, Outcome, Progress},
    domain::{CaseId, LinkError, Record, SectionId, Suite},
    remote::{Client, Error},
};

/// Name of the holding section used when none is configured.
pub const DEFAULT_SECTION_NAME: &str = "__to_be_deleted__";

/// The two holding sections used to mark nodes for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedSections {
    /// Holds cases marked for deletion. Its path is the holding name.
    pub cases: SectionId,
    /// Holds sections marked for deletion. Its path is `<name>/sections`.
    pub sections: SectionId,
}

/// Marks nodes for deletion by moving them into holding sections.
///
/// Nothing is ever deleted. Cases are moved into the `<name>` section and
/// sections into `<name>/sections`, where they keep their ids and history
/// until someone removes them by hand or restores them. The holding sections
/// are looked up, or created, on first use and then reused for the lifetime
/// of the handler.
#[derive(Debug)]
pub struct MarkForDeletionHandler<'a, C> {
    suite: &'a mut Suite,
    builder: Builder<'a, C>,
    section_name: Option<NonEmptyString>,
    reserved: Option<ReservedSections>,
}

impl<'a, C: Client> MarkForDeletionHandler<'a, C> {
    /// Creates a handler for `suite`, using `section_name` (or
    /// [`DEFAULT_SECTION_NAME`]) for the holding sections.
    pub fn new(
        suite: &'a mut Suite,
        builder: Builder<'a, C>,
        section_name: Option<NonEmptyString>,
    ) -> Self {
        Self {
            suite,
            builder,
            section_name,
            reserved: None,
        }
    }

    /// Name of the holding section for cases.
    pub fn section_name(&self) -> &str {
        self.section_name
            .as_ref()
            .map_or(DEFAULT_SECTION_NAME, NonEmptyString::as_str)
    }

    /// The suite being modified.
    pub fn suite(&self) -> &Suite {
        self.suite
    }

    /// Resolves the holding sections, creating whichever is missing.
    ///
    /// The result is cached, so the suite is searched at most once per
    /// handler.
    ///
    /// # Errors
    ///
    /// Returns an error if a holding section has to be created and the
    /// request fails.
    pub fn reserved_sections(&mut self) -> Result<ReservedSections, Error<C::Error>> {
        if let Some(reserved) = self.reserved {
            return Ok(reserved);
        }
        let cases_path = self.section_name().to_string();
        let sections_path = format!("{cases_path}/sections");
        let reserved = ReservedSections {
            cases: self.ensure_section(&cases_path)?,
            sections: self.ensure_section(&sections_path)?,
        };
        debug!(?reserved, "resolved holding sections");
        self.reserved = Some(reserved);
        Ok(reserved)
    }

    fn ensure_section(&mut self, path: &str) -> Result<SectionId, Error<C::Error>> {
        match self.suite.section_for_path(path) {
            Some(section) => Ok(section.section_id),
            None => self.builder.create_section_for_path(self.suite, path),
        }
    }

    /// Whether `path` starts with the holding section's name.
    fn is_marked(&self, path: Option<&str>) -> bool {
        path.is_some_and(|path| path.starts_with(self.section_name()))
    }

    pub(crate) fn mark_section_in_bulk(
        &mut self,
        section_id: SectionId,
        progress: Progress,
    ) -> Result<Outcome<SectionId>, Error<C::Error>> {
        let path = self.suite.section_path(section_id);
        let shown = path.as_deref().unwrap_or_default();
        if self.is_marked(path.as_deref()) {
            info!(
                "Section already marked for deletion: (ID: {section_id}, Path: {shown}) {progress}"
            );
            return Ok(Outcome::AlreadyMarked(section_id));
        }
        info!("Marking section for deletion: (ID: {section_id}, Path: {shown}) {progress}");
        self.delete_section(section_id)
    }

    pub(crate) fn mark_case_in_bulk(
        &mut self,
        case_id: CaseId,
        progress: Progress,
    ) -> Result<Outcome<CaseId>, Error<C::Error>> {
        let title = self
            .suite
            .case(case_id)
            .map(|case| case.title.clone())
            .unwrap_or_default();
        if self.is_marked(self.suite.case_path(case_id).as_deref()) {
            info!("Case already marked for deletion: (ID: {case_id}, Title: {title}) {progress}");
            return Ok(Outcome::AlreadyMarked(case_id));
        }
        info!("Marking case for deletion: (ID: {case_id}, Title: {title}) {progress}");
        self.delete_case(case_id)
    }
}

impl<C: Client> Deletion for MarkForDeletionHandler<'_, C> {
    type Error = Error<C::Error>;

    /// Moves the section under the holding section for sections.
    ///
    /// Only the section itself is relinked locally. Its descendants and their
    /// cases are dropped from the suite.
    fn delete_section(&mut self, section_id: SectionId) -> Result<Outcome<SectionId>, Self::Error> {
        let reserved = self.reserved_sections()?;
        debug!(%section_id, "marking section for deletion");
        self.builder
            .adapter()
            .move_section(self.suite, section_id, Some(reserved.sections))?;
        Ok(Outcome::Marked(section_id))
    }

    /// Moves the case into the holding section for cases.
    ///
    /// The case is updated remotely and the returned case replaces the local
    /// one.
    fn delete_case(&mut self, case_id: CaseId) -> Result<Outcome<CaseId>, Self::Error> {
        if self.suite.case(case_id).is_none() {
            return Err(LinkError::CaseNotFound(case_id).into());
        }
        let reserved = self.reserved_sections()?;
        debug!(%case_id, "marking case for deletion");

        let mut fields = Record::new();
        fields.insert("section_id".into(), json!(reserved.cases));
        let moved = self.builder.adapter().update_case(case_id, &fields)?;
        self.suite.check_case_link(&moved, Some(reserved.cases))?;

        self.suite.unlink_case(case_id);
        let moved_id = self.suite.link_case(moved, Some(reserved.cases))?;
        Ok(Outcome::Marked(moved_id))
    }

    fn delete_sections(&mut self, section_ids: Vec<SectionId>) -> Bulk<'_, Self, SectionId> {
        Bulk::new(self, section_ids, Self::mark_section_in_bulk)
    }

    fn delete_cases(&mut self, case_ids: Vec<CaseId>) -> Bulk<'_, Self, CaseId> {
        Bulk::new(self, case_ids, Self::mark_case_in_bulk)
    }
}
