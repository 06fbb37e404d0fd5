//! Removing sections and cases from a suite.
//!
//! Two strategies are provided. [`DeletionHandler`] deletes nodes through the
//! remote service, either for good or by flagging them (`soft`).
//! [`MarkForDeletionHandler`] never deletes anything: it moves nodes into
//! reserved holding sections so that they can be reviewed, and removed by
//! hand, later.
//!
//! Use [`deletion_handler`] to pick a strategy from [`DeletionSettings`].

use crate::{
    builder::Builder,
    config::DeletionSettings,
    domain::{CaseId, SectionId, Suite},
    remote::{Adapter, Client, Error},
};

mod bulk;
mod hard;
mod mark;

pub use bulk::{Bulk, Progress};
pub use hard::DeletionHandler;
pub use mark::{DEFAULT_SECTION_NAME, MarkForDeletionHandler, ReservedSections};

/// A strategy for removing sections and cases from a suite.
pub trait Deletion {
    /// The error returned when a node cannot be removed.
    type Error;

    /// Removes one section, with everything beneath it.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be removed. The suite is left
    /// unchanged.
    fn delete_section(&mut self, section_id: SectionId) -> Result<Outcome<SectionId>, Self::Error>;

    /// Removes one case.
    ///
    /// # Errors
    ///
    /// Returns an error if the case cannot be removed. The suite is left
    /// unchanged.
    fn delete_case(&mut self, case_id: CaseId) -> Result<Outcome<CaseId>, Self::Error>;

    /// Removes sections one at a time, in the given order, as the returned
    /// iterator is consumed.
    fn delete_sections(&mut self, section_ids: Vec<SectionId>) -> Bulk<'_, Self, SectionId>;

    /// Removes cases one at a time, in the given order, as the returned
    /// iterator is consumed.
    fn delete_cases(&mut self, case_ids: Vec<CaseId>) -> Bulk<'_, Self, CaseId>;
}

/// What happened to a node handed to a [`Deletion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Deleted remotely and unlinked from the suite.
    Deleted(T),
    /// Flagged as deleted remotely. The suite still holds it.
    Flagged(T),
    /// Moved into a holding section.
    Marked(T),
    /// Already inside a holding section. Nothing was sent.
    AlreadyMarked(T),
}

impl<T> Outcome<T> {
    /// The id of the node.
    pub const fn id(&self) -> &T {
        match self {
            Self::Deleted(id)
            | Self::Flagged(id)
            | Self::Marked(id)
            | Self::AlreadyMarked(id) => id,
        }
    }

    /// Whether the node now sits in a holding section.
    pub const fn is_marked(&self) -> bool {
        matches!(self, Self::Marked(_) | Self::AlreadyMarked(_))
    }
}

/// The deletion strategy chosen by [`deletion_handler`].
#[derive(Debug)]
pub enum Handler<'a, C> {
    /// Hard or soft deletion.
    Delete(DeletionHandler<'a, C>),
    /// Mark for deletion.
    Mark(MarkForDeletionHandler<'a, C>),
}

impl<C: Client> Handler<'_, C> {
    /// The suite being modified.
    pub fn suite(&self) -> &Suite {
        match self {
            Self::Delete(handler) => handler.suite(),
            Self::Mark(handler) => handler.suite(),
        }
    }

    fn section_step(
        &mut self,
        section_id: SectionId,
        progress: Progress,
    ) -> Result<Outcome<SectionId>, Error<C::Error>> {
        match self {
            Self::Delete(handler) => handler.delete_section_in_bulk(section_id, progress),
            Self::Mark(handler) => handler.mark_section_in_bulk(section_id, progress),
        }
    }

    fn case_step(
        &mut self,
        case_id: CaseId,
        progress: Progress,
    ) -> Result<Outcome<CaseId>, Error<C::Error>> {
        match self {
            Self::Delete(handler) => handler.delete_case_in_bulk(case_id, progress),
            Self::Mark(handler) => handler.mark_case_in_bulk(case_id, progress),
        }
    }
}

impl<C: Client> Deletion for Handler<'_, C> {
    type Error = Error<C::Error>;

    fn delete_section(&mut self, section_id: SectionId) -> Result<Outcome<SectionId>, Self::Error> {
        match self {
            Self::Delete(handler) => handler.delete_section(section_id),
            Self::Mark(handler) => handler.delete_section(section_id),
        }
    }

    fn delete_case(&mut self, case_id: CaseId) -> Result<Outcome<CaseId>, Self::Error> {
        match self {
            Self::Delete(handler) => handler.delete_case(case_id),
            Self::Mark(handler) => handler.delete_case(case_id),
        }
    }

    fn delete_sections(&mut self, section_ids: Vec<SectionId>) -> Bulk<'_, Self, SectionId> {
        Bulk::new(self, section_ids, Self::section_step)
    }

    fn delete_cases(&mut self, case_ids: Vec<CaseId>) -> Bulk<'_, Self, CaseId> {
        Bulk::new(self, case_ids, Self::case_step)
    }
}

/// Picks a deletion strategy for `suite` according to `settings`.
///
/// With `mark_for_deletion` set, nodes are moved into holding sections named
/// after `section_name`. Otherwise they are deleted remotely, only flagged
/// when `soft` is set.
pub fn deletion_handler<'a, C: Client>(
    suite: &'a mut Suite,
    adapter: &'a Adapter<C>,
    settings: &DeletionSettings,
) -> Handler<'a, C> {
    if settings.mark_for_deletion {
        Handler::Mark(MarkForDeletionHandler::new(
            suite,
            Builder::new(adapter),
            settings.section_name.clone(),
        ))
    } else {
        Handler::Delete(DeletionHandler::new(suite, adapter, settings.soft))
    }
}
