//! Linking, unlinking and moving nodes within a [`Suite`].
//!
//! Every operation validates first and mutates only once all checks have
//! passed, so a failed link leaves the suite exactly as it was.

use thiserror::Error;
use tracing::debug;

use crate::domain::{Case, CaseId, Section, SectionId, Suite, SuiteId};

/// Errors that can occur when linking nodes into a suite.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// The section belongs to a different suite.
    #[error("section.suite_id ({section}) does not match suite.suite_id ({suite})")]
    SectionSuiteMismatch {
        /// The section's `suite_id`.
        section: SuiteId,
        /// The suite's id.
        suite: SuiteId,
    },
    /// The section names a different parent.
    #[error(
        "section.parent_id ({}) does not match parent.section_id ({parent})",
        display_optional(.section.as_ref())
    )]
    ParentMismatch {
        /// The section's `parent_id`.
        section: Option<SectionId>,
        /// The id of the parent it was linked under.
        parent: SectionId,
    },
    /// The case belongs to a different suite.
    #[error("case.suite_id ({case}) does not match suite.suite_id ({suite})")]
    CaseSuiteMismatch {
        /// The case's `suite_id`.
        case: SuiteId,
        /// The suite's id.
        suite: SuiteId,
    },
    /// The case names a different section.
    #[error(
        "case.section_id ({}) does not match section.section_id ({section})",
        display_optional(.case.as_ref())
    )]
    CaseSectionMismatch {
        /// The case's `section_id`.
        case: Option<SectionId>,
        /// The id of the section it was linked under.
        section: SectionId,
    },
    /// The section is not held by the suite.
    #[error("section {0} not found in suite")]
    SectionNotFound(SectionId),
    /// The case is not held by the suite.
    #[error("case {0} not found in suite")]
    CaseNotFound(CaseId),
    /// A section with the same id is already held by the suite.
    #[error("section {0} is already linked")]
    SectionAlreadyLinked(SectionId),
    /// A case with the same id is already held by the suite.
    #[error("case {0} is already linked")]
    CaseAlreadyLinked(CaseId),
    /// The section would become its own ancestor.
    #[error("linking section {section} under {parent} would create a cycle")]
    Cycle {
        /// The section being linked or moved.
        section: SectionId,
        /// The requested parent.
        parent: SectionId,
    },
}

fn display_optional(id: Option<&SectionId>) -> String {
    id.map_or_else(|| "None".to_string(), ToString::to_string)
}

/// The nodes removed from a suite by [`Suite::unlink_section`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detached {
    /// The section that was unlinked.
    pub section: Section,
    /// Descendant sections, deepest first.
    pub descendants: Vec<Section>,
    /// Cases that were linked anywhere in the removed subtree.
    pub cases: Vec<Case>,
}

impl Suite {
    /// Links a section into the suite, optionally under a parent section.
    ///
    /// # Errors
    ///
    /// Returns an error, without changing the suite, if
    /// - the section belongs to a different suite
    /// - the section's `parent_id` does not name `parent`
    /// - `parent` is not held by the suite
    /// - a section with the same id is already held by the suite
    pub fn link_section(
        &mut self,
        section: Section,
        parent: Option<SectionId>,
    ) -> Result<SectionId, LinkError> {
        let section_id = section.section_id;
        if self.sections.contains_key(&section_id) {
            return Err(LinkError::SectionAlreadyLinked(section_id));
        }
        self.check_section_link(&section, parent)?;

        self.sections.insert(section_id, section);
        self.attach_section(section_id, parent);
        Ok(section_id)
    }

    /// Links a case into the suite, optionally under a section.
    ///
    /// # Errors
    ///
    /// Returns an error, without changing the suite, if
    /// - the case belongs to a different suite
    /// - the case's `section_id` does not name `section`
    /// - `section` is not held by the suite
    /// - a case with the same id is already held by the suite
    pub fn link_case(
        &mut self,
        case: Case,
        section: Option<SectionId>,
    ) -> Result<CaseId, LinkError> {
        let case_id = case.case_id;
        if self.cases.contains_key(&case_id) {
            return Err(LinkError::CaseAlreadyLinked(case_id));
        }
        self.check_case_link(&case, section)?;

        self.cases.insert(case_id, case);
        self.attach_case(case_id, section);
        Ok(case_id)
    }

    /// Hands sections to the suite without linking them to a parent.
    ///
    /// Registered sections can then be linked in any order with
    /// [`Suite::link_registered_section`]. A section with the same id as one
    /// already held replaces it.
    pub fn register_sections(&mut self, sections: impl IntoIterator<Item = Section>) {
        self.sections
            .extend(sections.into_iter().map(|section| (section.section_id, section)));
    }

    /// Hands cases to the suite without linking them to a section.
    pub fn register_cases(&mut self, cases: impl IntoIterator<Item = Case>) {
        self.cases
            .extend(cases.into_iter().map(|case| (case.case_id, case)));
    }

    /// Links a section already held by the suite under a parent.
    ///
    /// # Errors
    ///
    /// Returns an error, without changing the suite, if the section is not
    /// held by the suite, or if linking it would break one of the checks made
    /// by [`Suite::link_section`] or create a cycle.
    pub fn link_registered_section(
        &mut self,
        section_id: SectionId,
        parent: Option<SectionId>,
    ) -> Result<(), LinkError> {
        let section = self
            .sections
            .get(&section_id)
            .ok_or(LinkError::SectionNotFound(section_id))?;
        self.check_section_link(section, parent)?;
        self.attach_section(section_id, parent);
        Ok(())
    }

    /// Links a case already held by the suite under a section.
    ///
    /// # Errors
    ///
    /// Returns an error, without changing the suite, if the case is not held
    /// by the suite or if linking it would break one of the checks made by
    /// [`Suite::link_case`].
    pub fn link_registered_case(
        &mut self,
        case_id: CaseId,
        section: Option<SectionId>,
    ) -> Result<(), LinkError> {
        let case = self
            .cases
            .get(&case_id)
            .ok_or(LinkError::CaseNotFound(case_id))?;
        self.check_case_link(case, section)?;
        self.attach_case(case_id, section);
        Ok(())
    }

    /// Removes a case from the suite and from its section.
    ///
    /// Returns the unlinked case, or `None` if the suite does not hold it.
    pub fn unlink_case(&mut self, case_id: CaseId) -> Option<Case> {
        let mut case = self.cases.remove(&case_id)?;
        if let Some(section_id) = case.links.section.take() {
            if let Some(section) = self.sections.get_mut(&section_id) {
                section.links.cases.remove(&case_id);
            }
        }
        case.links.suite = None;
        debug!(%case_id, "unlinked case");
        Some(case)
    }

    /// Removes a section and its whole subtree from the suite.
    ///
    /// Descendant sections and every case beneath them are unlinked before the
    /// section itself is detached from its parent. Returns the removed nodes,
    /// or `None` if the suite does not hold the section.
    pub fn unlink_section(&mut self, section_id: SectionId) -> Option<Detached> {
        if !self.sections.contains_key(&section_id) {
            return None;
        }
        let mut sections = Vec::new();
        let mut cases = Vec::new();
        self.unlink_subtree(section_id, &mut sections, &mut cases);

        // the subtree root is always detached last
        let section = sections.pop()?;
        debug!(
            %section_id,
            descendants = sections.len(),
            cases = cases.len(),
            "unlinked section"
        );
        Some(Detached {
            section,
            descendants: sections,
            cases,
        })
    }

    fn unlink_subtree(
        &mut self,
        section_id: SectionId,
        sections: &mut Vec<Section>,
        cases: &mut Vec<Case>,
    ) {
        let Some(section) = self.sections.get(&section_id) else {
            return;
        };
        let children: Vec<_> = section.links.sections.iter().copied().collect();
        let case_ids: Vec<_> = section.links.cases.iter().copied().collect();

        for child in children {
            self.unlink_subtree(child, sections, cases);
        }
        cases.extend(case_ids.into_iter().filter_map(|case_id| self.unlink_case(case_id)));

        if let Some(mut section) = self.sections.remove(&section_id) {
            if let Some(parent) = section.links.parent.take() {
                if let Some(parent) = self.sections.get_mut(&parent) {
                    parent.links.sections.remove(&section_id);
                }
            }
            section.links.suite = None;
            sections.push(section);
        }
    }

    /// Moves a section under a new parent, or to the root when `new_parent`
    /// is `None`.
    ///
    /// The section is unlinked and then linked again under `new_parent`, so
    /// its descendants and their cases are dropped from the suite. They are
    /// returned in [`Detached::descendants`] and [`Detached::cases`], next to
    /// a copy of the relinked section.
    ///
    /// # Errors
    ///
    /// Returns an error, without changing the suite, if either section is not
    /// held by the suite or the move would make the section its own ancestor.
    pub fn move_section(
        &mut self,
        section_id: SectionId,
        new_parent: Option<SectionId>,
    ) -> Result<Detached, LinkError> {
        self.check_move(section_id, new_parent)?;
        let Some(Detached {
            mut section,
            descendants,
            cases,
        }) = self.unlink_section(section_id)
        else {
            return Err(LinkError::SectionNotFound(section_id));
        };

        section.parent_id = new_parent;
        section.depth = new_parent
            .and_then(|parent| self.sections.get(&parent))
            .map_or(0, |parent| parent.depth + 1);
        self.link_section(section.clone(), new_parent)?;
        if let Some(linked) = self.sections.get(&section_id) {
            section.clone_from(linked);
        }
        debug!(%section_id, new_parent = ?new_parent, dropped = descendants.len(), "moved section");
        Ok(Detached {
            section,
            descendants,
            cases,
        })
    }

    /// Checks that a section can be moved under `new_parent`.
    pub(crate) fn check_move(
        &self,
        section_id: SectionId,
        new_parent: Option<SectionId>,
    ) -> Result<(), LinkError> {
        if !self.sections.contains_key(&section_id) {
            return Err(LinkError::SectionNotFound(section_id));
        }
        if let Some(parent) = new_parent {
            if !self.sections.contains_key(&parent) {
                return Err(LinkError::SectionNotFound(parent));
            }
            if self.is_ancestor(section_id, parent) {
                return Err(LinkError::Cycle {
                    section: section_id,
                    parent,
                });
            }
        }
        Ok(())
    }

    /// Checks the linking invariants of a section without linking it.
    pub(crate) fn check_section_link(
        &self,
        section: &Section,
        parent: Option<SectionId>,
    ) -> Result<(), LinkError> {
        if section.suite_id != self.suite_id {
            return Err(LinkError::SectionSuiteMismatch {
                section: section.suite_id,
                suite: self.suite_id,
            });
        }
        if let Some(parent) = parent {
            if section.parent_id != Some(parent) {
                return Err(LinkError::ParentMismatch {
                    section: section.parent_id,
                    parent,
                });
            }
            if !self.sections.contains_key(&parent) {
                return Err(LinkError::SectionNotFound(parent));
            }
            if self.is_ancestor(section.section_id, parent) {
                return Err(LinkError::Cycle {
                    section: section.section_id,
                    parent,
                });
            }
        }
        Ok(())
    }

    /// Checks the linking invariants of a case without linking it.
    pub(crate) fn check_case_link(
        &self,
        case: &Case,
        section: Option<SectionId>,
    ) -> Result<(), LinkError> {
        if case.suite_id != self.suite_id {
            return Err(LinkError::CaseSuiteMismatch {
                case: case.suite_id,
                suite: self.suite_id,
            });
        }
        if let Some(section) = section {
            if case.section_id != Some(section) {
                return Err(LinkError::CaseSectionMismatch {
                    case: case.section_id,
                    section,
                });
            }
            if !self.sections.contains_key(&section) {
                return Err(LinkError::SectionNotFound(section));
            }
        }
        Ok(())
    }

    /// Whether `ancestor` is `section_id` or one of its linked ancestors.
    fn is_ancestor(&self, ancestor: SectionId, section_id: SectionId) -> bool {
        self.ancestors(section_id)
            .any(|section| section.section_id == ancestor)
    }

    fn attach_section(&mut self, section_id: SectionId, parent: Option<SectionId>) {
        let suite_id = self.suite_id;
        let Some(section) = self.sections.get_mut(&section_id) else {
            return;
        };
        section.links.suite = Some(suite_id);
        let previous = std::mem::replace(&mut section.links.parent, parent);

        if let Some(previous) = previous.and_then(|id| self.sections.get_mut(&id)) {
            previous.links.sections.remove(&section_id);
        }
        if let Some(parent) = parent.and_then(|id| self.sections.get_mut(&id)) {
            parent.links.sections.insert(section_id);
        }
        debug!(%section_id, parent = ?parent, "linked section");
    }

    fn attach_case(&mut self, case_id: CaseId, section: Option<SectionId>) {
        let suite_id = self.suite_id;
        let Some(case) = self.cases.get_mut(&case_id) else {
            return;
        };
        case.links.suite = Some(suite_id);
        let previous = std::mem::replace(&mut case.links.section, section);

        if let Some(previous) = previous.and_then(|id| self.sections.get_mut(&id)) {
            previous.links.cases.remove(&case_id);
        }
        if let Some(section) = section.and_then(|id| self.sections.get_mut(&id)) {
            section.links.cases.insert(case_id);
        }
        debug!(%case_id, section = ?section, "linked case");
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::testing::{case, empty_suite, linked_suite, section};

    #[test]
    fn links_sections_and_cases_both_ways() {
        let mut suite = empty_suite();
        suite.link_section(section(10, None, "A"), None).unwrap();
        suite.link_section(section(11, Some(10), "B"), Some(SectionId::new(10))).unwrap();
        suite.link_case(case(100, Some(11)), Some(SectionId::new(11))).unwrap();

        let parent = suite.section(SectionId::new(10)).unwrap();
        assert!(parent.sections().contains(&SectionId::new(11)));
        let child = suite.section(SectionId::new(11)).unwrap();
        assert_eq!(child.parent(), Some(SectionId::new(10)));
        assert_eq!(child.suite(), Some(suite.suite_id));
        assert!(child.cases().contains(&CaseId::new(100)));
        assert_eq!(suite.case(CaseId::new(100)).unwrap().section(), Some(SectionId::new(11)));
    }

    #[test]
    fn section_in_other_suite_is_rejected() {
        let mut suite = empty_suite();
        let mut foreign = section(10, None, "A");
        foreign.suite_id = SuiteId::new(3);
        suite.suite_id = SuiteId::new(4);

        let err = suite.link_section(foreign, None).unwrap_err();

        assert_eq!(
            err.to_string(),
            "section.suite_id (3) does not match suite.suite_id (4)"
        );
        assert!(suite.sections().is_empty());
    }

    #[test]
    fn section_under_wrong_parent_is_rejected() {
        let mut suite = linked_suite();

        let err = suite
            .link_section(section(20, Some(10), "X"), Some(SectionId::new(13)))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "section.parent_id (10) does not match parent.section_id (13)"
        );
        assert!(suite.section(SectionId::new(20)).is_none());
        let other = suite.section(SectionId::new(13)).unwrap();
        assert!(!other.sections().contains(&SectionId::new(20)));
    }

    #[test]
    fn root_section_under_parent_is_rejected() {
        let mut suite = linked_suite();

        let err = suite
            .link_section(section(20, None, "X"), Some(SectionId::new(13)))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "section.parent_id (None) does not match parent.section_id (13)"
        );
    }

    #[test]
    fn case_checks_report_both_values() {
        let mut suite = linked_suite();

        let mut foreign = case(200, None);
        foreign.suite_id = SuiteId::new(9);
        let err = suite.link_case(foreign, None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "case.suite_id (9) does not match suite.suite_id (1)"
        );

        let err = suite
            .link_case(case(200, Some(10)), Some(SectionId::new(11)))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "case.section_id (10) does not match section.section_id (11)"
        );
        assert!(suite.case(CaseId::new(200)).is_none());
    }

    #[test]
    fn case_without_section_links_to_suite_only() {
        let mut suite = empty_suite();
        suite.link_case(case(100, None), None).unwrap();

        let linked = suite.case(CaseId::new(100)).unwrap();
        assert!(linked.is_linked());
        assert_eq!(linked.section(), None);
        assert_eq!(suite.case_path(CaseId::new(100)), None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut suite = linked_suite();

        assert_eq!(
            suite.link_section(section(10, None, "A"), None),
            Err(LinkError::SectionAlreadyLinked(SectionId::new(10)))
        );
        assert_eq!(
            suite.link_case(case(100, Some(11)), Some(SectionId::new(11))),
            Err(LinkError::CaseAlreadyLinked(CaseId::new(100)))
        );
    }

    #[test]
    fn parent_must_be_held_by_suite() {
        let mut suite = empty_suite();

        assert_eq!(
            suite.link_section(section(11, Some(10), "B"), Some(SectionId::new(10))),
            Err(LinkError::SectionNotFound(SectionId::new(10)))
        );
    }

    #[test]
    fn unlink_then_relink_restores_state() {
        let mut suite = linked_suite();
        let before = suite.clone();

        let unlinked = suite.unlink_case(CaseId::new(100)).expect("case is linked");
        assert!(!unlinked.is_linked());
        assert!(!suite.section(SectionId::new(11)).unwrap().cases().contains(&CaseId::new(100)));

        suite.link_case(unlinked, Some(SectionId::new(11))).unwrap();
        assert_eq!(suite, before);
    }

    #[test]
    fn unlinking_a_section_cascades() {
        let mut suite = linked_suite();

        let detached = suite.unlink_section(SectionId::new(11)).expect("section is linked");

        assert_eq!(detached.section.section_id, SectionId::new(11));
        let descendants: Vec<_> = detached.descendants.iter().map(|s| s.section_id).collect();
        assert_eq!(descendants, [SectionId::new(12)]);
        let mut cases: Vec<_> = detached.cases.iter().map(|c| c.case_id).collect();
        cases.sort();
        assert_eq!(cases, [CaseId::new(100), CaseId::new(101)]);
        assert!(detached.cases.iter().all(|c| !c.is_linked()));
        assert!(!detached.section.is_linked());

        assert!(suite.section(SectionId::new(12)).is_none());
        assert!(suite.case(CaseId::new(101)).is_none());
        assert!(suite.section(SectionId::new(10)).unwrap().sections().is_empty());
        assert!(suite.case(CaseId::new(102)).is_some());
    }

    #[test]
    fn linking_then_unlinking_a_section_restores_state() {
        let mut suite = linked_suite();
        let before = suite.clone();

        suite.link_section(section(20, Some(10), "E"), Some(SectionId::new(10))).unwrap();
        let parent = suite.section(SectionId::new(10)).unwrap();
        assert!(parent.sections().contains(&SectionId::new(20)));

        let detached = suite.unlink_section(SectionId::new(20)).expect("section is linked");
        assert!(!detached.section.is_linked());
        assert_eq!(suite, before);
    }

    #[test]
    fn unlinking_the_root_empties_the_suite() {
        let mut suite = empty_suite();
        suite.link_section(section(10, None, "A"), None).unwrap();
        suite.link_section(section(11, Some(10), "B"), Some(SectionId::new(10))).unwrap();
        suite.link_case(case(100, Some(11)), Some(SectionId::new(11))).unwrap();
        assert_eq!(suite.case_path(CaseId::new(100)).as_deref(), Some("A/B"));

        suite.unlink_section(SectionId::new(10)).expect("section is linked");

        assert_eq!(suite.sections().len(), 0);
        assert_eq!(suite.cases().len(), 0);
    }

    #[test]
    fn unlinking_unknown_nodes_is_a_no_op() {
        let mut suite = linked_suite();
        let before = suite.clone();

        assert!(suite.unlink_section(SectionId::new(99)).is_none());
        assert!(suite.unlink_case(CaseId::new(999)).is_none());
        assert_eq!(suite, before);
    }

    #[test]
    fn move_relinks_the_section_alone() {
        let mut suite = linked_suite();

        let dropped = suite
            .move_section(SectionId::new(11), Some(SectionId::new(13)))
            .unwrap();

        let moved = suite.section(SectionId::new(11)).unwrap();
        assert_eq!(moved.parent_id, Some(SectionId::new(13)));
        assert_eq!(moved.depth, 1);
        assert!(moved.sections().is_empty());
        assert!(moved.cases().is_empty());
        assert_eq!(&dropped.section, moved);
        assert_eq!(suite.section_path(SectionId::new(11)).as_deref(), Some("D/B"));

        let descendants: Vec<_> = dropped.descendants.iter().map(|s| s.section_id).collect();
        assert_eq!(descendants, [SectionId::new(12)]);
        let mut cases: Vec<_> = dropped.cases.iter().map(|c| c.case_id).collect();
        cases.sort();
        assert_eq!(cases, [CaseId::new(100), CaseId::new(101)]);
        assert!(suite.section(SectionId::new(12)).is_none());
        assert!(suite.case(CaseId::new(100)).is_none());
        assert!(suite.case(CaseId::new(101)).is_none());
        assert!(suite.section(SectionId::new(10)).unwrap().sections().is_empty());
        let new_parent = suite.section(SectionId::new(13)).unwrap();
        assert!(new_parent.sections().contains(&SectionId::new(11)));
    }

    #[test]
    fn move_to_root() {
        let mut suite = linked_suite();

        suite.move_section(SectionId::new(12), None).unwrap();

        assert_eq!(suite.section_path(SectionId::new(12)).as_deref(), Some("C"));
        assert_eq!(suite.section(SectionId::new(12)).unwrap().parent_id, None);
    }

    #[test_case(10, 12; "into own descendant")]
    #[test_case(11, 11; "under itself")]
    fn move_into_own_subtree_is_rejected(moved: u64, parent: u64) {
        let mut suite = linked_suite();
        let before = suite.clone();

        let err = suite
            .move_section(SectionId::new(moved), Some(SectionId::new(parent)))
            .unwrap_err();

        assert_eq!(
            err,
            LinkError::Cycle {
                section: SectionId::new(moved),
                parent: SectionId::new(parent),
            }
        );
        assert_eq!(suite, before);
    }

    #[test]
    fn registered_nodes_link_in_any_order() {
        let mut suite = empty_suite();
        suite.register_sections([section(11, Some(10), "B"), section(10, None, "A")]);
        suite.register_cases([case(100, Some(11))]);

        suite.link_registered_section(SectionId::new(11), Some(SectionId::new(10))).unwrap();
        suite.link_registered_section(SectionId::new(10), None).unwrap();
        suite.link_registered_case(CaseId::new(100), Some(SectionId::new(11))).unwrap();

        assert_eq!(suite.case_path(CaseId::new(100)).as_deref(), Some("A/B"));
    }

    #[test]
    fn registered_cycle_is_rejected() {
        let mut suite = empty_suite();
        suite.register_sections([section(10, Some(11), "A"), section(11, Some(10), "B")]);

        suite.link_registered_section(SectionId::new(10), Some(SectionId::new(11))).unwrap();
        let err = suite
            .link_registered_section(SectionId::new(11), Some(SectionId::new(10)))
            .unwrap_err();

        assert!(matches!(err, LinkError::Cycle { .. }));
    }
}
