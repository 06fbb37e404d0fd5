use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{
    Case, CaseId, ProjectId, Section, SectionId, SectionView, SuiteId,
    record::{self, Record, RecordError, flag},
};

/// A suite and the arena of sections and cases linked into it.
///
/// The suite owns every [`Section`] and [`Case`] of its hierarchy, keyed by
/// id. Parent/child relations are stored on the nodes as ids, so the graph
/// has a single owner and no reference cycles. The linking operations live in
/// the `link` module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Suite {
    /// Unique suite id.
    #[serde(rename = "id")]
    pub suite_id: SuiteId,
    /// Id of the owning project. This is only a foreign key; the project
    /// object is not linked back.
    pub project_id: ProjectId,
    /// Display name.
    pub name: String,
    /// Web address of the suite.
    #[serde(default)]
    pub url: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the suite has been completed.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_completed: bool,
    /// Whether this is the master suite of its project.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_master: bool,
    /// Whether this suite is a baseline.
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub is_baseline: bool,
    /// When the suite was completed, if it was.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub completed_on: Option<DateTime<Utc>>,

    #[serde(skip)]
    pub(crate) sections: BTreeMap<SectionId, Section>,
    #[serde(skip)]
    pub(crate) cases: BTreeMap<CaseId, Case>,
}

impl Suite {
    /// Decodes a suite from its wire record. The returned suite is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or has the wrong type.
    pub fn from_data(record: &Record) -> Result<Self, RecordError> {
        record::decode("suite", record)
    }

    /// Every section held by the suite, keyed by id.
    #[must_use]
    pub const fn sections(&self) -> &BTreeMap<SectionId, Section> {
        &self.sections
    }

    /// Every case held by the suite, keyed by id.
    #[must_use]
    pub const fn cases(&self) -> &BTreeMap<CaseId, Case> {
        &self.cases
    }

    /// Looks up a section by id.
    #[must_use]
    pub fn section(&self, section_id: SectionId) -> Option<&Section> {
        self.sections.get(&section_id)
    }

    /// Looks up a case by id.
    #[must_use]
    pub fn case(&self, case_id: CaseId) -> Option<&Case> {
        self.cases.get(&case_id)
    }

    /// A borrowed view of a section together with this suite.
    #[must_use]
    pub fn view(&self, section_id: SectionId) -> Option<SectionView<'_>> {
        self.section(section_id)
            .map(|section| SectionView::new(self, section))
    }

    /// Sections without a linked parent section.
    pub fn direct_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values().filter(|s| s.parent().is_none())
    }

    /// Cases without a linked section.
    pub fn direct_cases(&self) -> impl Iterator<Item = &Case> {
        self.cases.values().filter(|c| c.section().is_none())
    }

    /// Iterates from a section up through its linked ancestors, starting with
    /// the section itself.
    pub(crate) fn ancestors(&self, section_id: SectionId) -> impl Iterator<Item = &Section> {
        std::iter::successors(self.sections.get(&section_id), |section| {
            section.parent().and_then(|parent| self.sections.get(&parent))
        })
    }

    /// The `/`-joined names from the root down to the section.
    ///
    /// The path is computed from the current parent chain every time.
    #[must_use]
    pub fn section_path(&self, section_id: SectionId) -> Option<String> {
        self.view(section_id).map(|view| view.path())
    }

    /// The path of the section a case is linked to.
    ///
    /// Returns `None` if the case is unknown or not linked to a section.
    #[must_use]
    pub fn case_path(&self, case_id: CaseId) -> Option<String> {
        let section = self.cases.get(&case_id)?.section()?;
        self.section_path(section)
    }

    /// The path of every section, keyed by section id.
    #[must_use]
    pub fn all_section_paths(&self) -> BTreeMap<SectionId, String> {
        self.sections
            .keys()
            .filter_map(|&id| self.section_path(id).map(|path| (id, path)))
            .collect()
    }

    /// Finds the section with the given path.
    ///
    /// Sections are scanned in ascending id order, so when two sections share a
    /// path the one with the lowest id is returned.
    #[must_use]
    pub fn section_for_path(&self, path: &str) -> Option<&Section> {
        self.sections
            .values()
            .find(|section| self.section_path(section.section_id).as_deref() == Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{linked_suite, section};

    #[test]
    fn paths_follow_the_parent_chain() {
        let suite = linked_suite();

        assert_eq!(suite.section_path(SectionId::new(10)).as_deref(), Some("A"));
        assert_eq!(suite.section_path(SectionId::new(11)).as_deref(), Some("A/B"));
        assert_eq!(suite.section_path(SectionId::new(12)).as_deref(), Some("A/B/C"));
        assert_eq!(suite.case_path(CaseId::new(100)).as_deref(), Some("A/B"));
        assert_eq!(suite.section_path(SectionId::new(99)), None);
    }

    #[test]
    fn all_section_paths_covers_every_section() {
        let suite = linked_suite();
        let paths = suite.all_section_paths();

        assert_eq!(paths.len(), suite.sections().len());
        assert_eq!(paths[&SectionId::new(13)], "D");
    }

    #[test]
    fn duplicate_paths_resolve_to_lowest_id() {
        let mut suite = linked_suite();
        suite.link_section(section(30, None, "D"), None).unwrap();

        let found = suite.section_for_path("D").expect("path should resolve");
        assert_eq!(found.section_id, SectionId::new(13));
        assert!(suite.section_for_path("A/X").is_none());
    }

    #[test]
    fn direct_views_use_link_state() {
        let suite = linked_suite();

        let roots: Vec<_> = suite.direct_sections().map(|s| s.section_id).collect();
        assert_eq!(roots, [SectionId::new(10), SectionId::new(13)]);

        let loose: Vec<_> = suite.direct_cases().map(|c| c.case_id).collect();
        assert_eq!(loose, [CaseId::new(102)]);
    }
}
