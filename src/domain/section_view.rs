use std::ops::Deref;

use crate::domain::{Case, Section, Suite};

/// A borrowed view of a section within its suite.
///
/// The view resolves the section's links against the suite, so callers can
/// walk the hierarchy without looking ids up by hand.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    suite: &'a Suite,
    section: &'a Section,
}

impl<'a> SectionView<'a> {
    pub(crate) const fn new(suite: &'a Suite, section: &'a Section) -> Self {
        Self { suite, section }
    }

    /// The underlying section.
    #[must_use]
    pub const fn section(&self) -> &'a Section {
        self.section
    }

    /// The `/`-joined section names from the root down to this section.
    #[must_use]
    pub fn path(&self) -> String {
        let mut names: Vec<&str> = self
            .suite
            .ancestors(self.section.section_id)
            .map(|section| section.name.as_str())
            .collect();
        names.reverse();
        names.join("/")
    }

    /// The linked parent section.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.section
            .parent()
            .and_then(|parent| self.suite.view(parent))
    }

    /// Linked child sections, in ascending id order.
    pub fn child_sections(&self) -> impl Iterator<Item = SectionView<'a>> + 'a {
        let suite = self.suite;
        self.section
            .sections()
            .iter()
            .filter_map(move |&id| suite.view(id))
    }

    /// Linked cases, in ascending id order.
    pub fn cases(&self) -> impl Iterator<Item = &'a Case> + 'a {
        let suite = self.suite;
        self.section
            .cases()
            .iter()
            .filter_map(move |&id| suite.case(id))
    }
}

impl Deref for SectionView<'_> {
    type Target = Section;

    fn deref(&self) -> &Self::Target {
        self.section
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{CaseId, SectionId},
        testing::linked_suite,
    };

    #[test]
    fn walks_the_hierarchy() {
        let suite = linked_suite();
        let view = suite.view(SectionId::new(11)).expect("section is linked");

        assert_eq!(view.name, "B");
        assert_eq!(view.path(), "A/B");
        assert_eq!(view.parent().map(|p| p.section_id), Some(SectionId::new(10)));

        let children: Vec<_> = view.child_sections().map(|c| c.path()).collect();
        assert_eq!(children, ["A/B/C"]);

        let cases: Vec<_> = view.cases().map(|c| c.case_id).collect();
        assert_eq!(cases, [CaseId::new(100)]);
    }

    #[test]
    fn root_has_no_parent() {
        let suite = linked_suite();
        let root = suite.view(SectionId::new(10)).unwrap();
        assert!(root.parent().is_none());
        assert_eq!(root.path(), "A");
    }
}
