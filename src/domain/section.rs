use std::collections::BTreeSet;

use serde::Deserialize;

use crate::domain::{
    CaseId, SectionId, SuiteId,
    record::{self, Record, RecordError},
};

/// A folder in a suite. Sections nest under other sections and hold cases.
///
/// The public fields mirror the remote record. The link state (owning suite,
/// parent, child sections and cases) is managed by the [`Suite`] that holds
/// the section and is read through the accessor methods.
///
/// [`Suite`]: crate::domain::Suite
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Section {
    /// Unique section id.
    #[serde(rename = "id")]
    pub section_id: SectionId,
    /// Id of the suite this section belongs to.
    pub suite_id: SuiteId,
    /// Id of the parent section, if this is not a root section.
    #[serde(default)]
    pub parent_id: Option<SectionId>,
    /// Nesting level as reported by the service. Root sections are at depth 0.
    #[serde(default)]
    pub depth: u32,
    /// Position among its siblings.
    #[serde(default)]
    pub display_order: i64,
    /// Display name. Forms one component of the section path.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,

    #[serde(skip)]
    pub(crate) links: SectionLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SectionLinks {
    pub suite: Option<SuiteId>,
    pub parent: Option<SectionId>,
    pub sections: BTreeSet<SectionId>,
    pub cases: BTreeSet<CaseId>,
}

impl Section {
    /// Creates an unlinked root section.
    #[must_use]
    pub fn new(section_id: SectionId, suite_id: SuiteId, name: impl Into<String>) -> Self {
        Self {
            section_id,
            suite_id,
            parent_id: None,
            depth: 0,
            display_order: 0,
            name: name.into(),
            description: None,
            links: SectionLinks::default(),
        }
    }

    /// Sets the parent id of an unlinked section.
    #[must_use]
    pub const fn with_parent(mut self, parent_id: SectionId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Decodes a section from its wire record. The result is unlinked.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or has the wrong type.
    pub fn from_data(record: &Record) -> Result<Self, RecordError> {
        record::decode("section", record)
    }

    /// The suite this section is linked into.
    #[must_use]
    pub const fn suite(&self) -> Option<SuiteId> {
        self.links.suite
    }

    /// The linked parent section.
    #[must_use]
    pub const fn parent(&self) -> Option<SectionId> {
        self.links.parent
    }

    /// Linked child sections.
    #[must_use]
    pub const fn sections(&self) -> &BTreeSet<SectionId> {
        &self.links.sections
    }

    /// Linked cases.
    #[must_use]
    pub const fn cases(&self) -> &BTreeSet<CaseId> {
        &self.links.cases
    }

    /// Whether the section is currently linked into a suite.
    #[must_use]
    pub const fn is_linked(&self) -> bool {
        self.links.suite.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::section_record;

    #[test]
    fn decodes_unlinked_section() {
        let mut record = section_record(
            SectionId::new(11),
            SuiteId::new(1),
            Some(SectionId::new(10)),
            "B",
        );
        record.insert("depth".into(), 1.into());
        record.insert("description".into(), "nested".into());

        let section = Section::from_data(&record).expect("record should decode");

        assert_eq!(section.section_id, SectionId::new(11));
        assert_eq!(section.parent_id, Some(SectionId::new(10)));
        assert_eq!(section.depth, 1);
        assert_eq!(section.description.as_deref(), Some("nested"));
        assert!(!section.is_linked());
        assert_eq!(section.parent(), None);
        assert!(section.sections().is_empty());
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut record = section_record(SectionId::new(11), SuiteId::new(1), None, "B");
        record.remove("name");
        let err = Section::from_data(&record).unwrap_err();
        assert_eq!(err.kind(), "section");
    }
}
