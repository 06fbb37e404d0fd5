use tracing::{debug, info};

use crate::{
    deletion::{Bulk, Deletion, Outcome, Progress},
    domain::{CaseId, SectionId, Suite},
    remote::{Adapter, Client, Error},
};

/// Deletes cases and sections through the remote service.
///
/// Use with care. A hard deletion destroys the case history on the service,
/// and re-creating a case does not restore its id. With `soft` set, the
/// service is only asked to flag the nodes and the local suite is left
/// untouched.
#[derive(Debug)]
pub struct DeletionHandler<'a, C> {
    suite: &'a mut Suite,
    adapter: &'a Adapter<C>,
    soft: bool,
}

impl<'a, C: Client> DeletionHandler<'a, C> {
    /// Creates a handler deleting nodes of `suite`.
    pub const fn new(suite: &'a mut Suite, adapter: &'a Adapter<C>, soft: bool) -> Self {
        Self {
            suite,
            adapter,
            soft,
        }
    }

    /// Whether deletions only flag nodes.
    pub const fn soft(&self) -> bool {
        self.soft
    }

    /// The suite being modified.
    pub fn suite(&self) -> &Suite {
        self.suite
    }

    fn outcome<T>(&self, id: T) -> Outcome<T> {
        if self.soft {
            Outcome::Flagged(id)
        } else {
            Outcome::Deleted(id)
        }
    }

    pub(crate) fn delete_section_in_bulk(
        &mut self,
        section_id: SectionId,
        progress: Progress,
    ) -> Result<Outcome<SectionId>, Error<C::Error>> {
        let path = self.suite.section_path(section_id).unwrap_or_default();
        info!("Deleting section: (ID: {section_id}, Path: {path}) {progress}");
        self.delete_section(section_id)
    }

    pub(crate) fn delete_case_in_bulk(
        &mut self,
        case_id: CaseId,
        progress: Progress,
    ) -> Result<Outcome<CaseId>, Error<C::Error>> {
        let title = self
            .suite
            .case(case_id)
            .map(|case| case.title.clone())
            .unwrap_or_default();
        info!("Deleting case: (ID: {case_id}, Title: {title}) {progress}");
        self.delete_case(case_id)
    }
}

impl<C: Client> Deletion for DeletionHandler<'_, C> {
    type Error = Error<C::Error>;

    fn delete_section(&mut self, section_id: SectionId) -> Result<Outcome<SectionId>, Self::Error> {
        debug!(%section_id, soft = self.soft, "deleting section");
        self.adapter
            .delete_section(self.suite, section_id, self.soft)?;
        Ok(self.outcome(section_id))
    }

    fn delete_case(&mut self, case_id: CaseId) -> Result<Outcome<CaseId>, Self::Error> {
        debug!(%case_id, soft = self.soft, "deleting case");
        self.adapter.delete_case(self.suite, case_id, self.soft)?;
        Ok(self.outcome(case_id))
    }

    fn delete_sections(&mut self, section_ids: Vec<SectionId>) -> Bulk<'_, Self, SectionId> {
        Bulk::new(self, section_ids, Self::delete_section_in_bulk)
    }

    fn delete_cases(&mut self, case_ids: Vec<CaseId>) -> Bulk<'_, Self, CaseId> {
        Bulk::new(self, case_ids, Self::delete_case_in_bulk)
    }
}
