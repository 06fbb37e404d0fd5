//! Reconstructs linked suite hierarchies from the flat listings of the remote
//! service.

use std::{collections::BTreeMap, num::NonZeroUsize};

use tracing::{debug, instrument};

use crate::{
    config::Config,
    domain::{Case, CaseId, ProjectId, Section, SectionId, Suite, SuiteId},
    remote::{Adapter, CaseFilter, Client, Error, NewSection},
};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = match NonZeroUsize::new(250) {
    Some(size) => size,
    None => unreachable!(),
};

/// Builds linked [`Suite`] hierarchies through an [`Adapter`].
#[derive(Debug)]
pub struct Builder<'a, C> {
    adapter: &'a Adapter<C>,
    page_size: NonZeroUsize,
}

impl<C> Clone for Builder<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Builder<'_, C> {}

impl<'a, C: Client> Builder<'a, C> {
    /// A builder that requests listings in pages of [`DEFAULT_PAGE_SIZE`].
    pub const fn new(adapter: &'a Adapter<C>) -> Self {
        Self {
            adapter,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// A builder using the page size from `config`.
    pub const fn from_config(adapter: &'a Adapter<C>, config: &Config) -> Self {
        Self::new(adapter).with_page_size(config.page_size())
    }

    /// Requests listings in pages of `page_size` records.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The adapter requests are issued through.
    pub const fn adapter(&self) -> &'a Adapter<C> {
        self.adapter
    }

    /// The number of records requested per page.
    pub const fn page_size(&self) -> NonZeroUsize {
        self.page_size
    }

    /// Fetches a suite with all of its sections and cases, linked.
    ///
    /// Sections are linked under their parent and cases under their section.
    /// A parent or section that is not part of the fetched listings is
    /// tolerated: the node is linked at the root of the suite instead.
    ///
    /// # Errors
    ///
    /// Returns an error if any request fails, a record is malformed, or the
    /// fetched records are inconsistent (e.g. a section of another suite or a
    /// cycle between sections).
    #[instrument(skip(self))]
    pub fn build_suite(
        &self,
        project_id: ProjectId,
        suite_id: SuiteId,
    ) -> Result<Suite, Error<C::Error>> {
        let mut suite = self.adapter.get_suite(suite_id)?;

        let sections: BTreeMap<SectionId, Section> = self
            .adapter
            .get_sections(project_id, Some(suite_id), self.page_size)
            .map(|section| section.map(|section| (section.section_id, section)))
            .collect::<Result<_, _>>()?;
        let cases: BTreeMap<CaseId, Case> = self
            .adapter
            .get_cases(project_id, CaseFilter::for_suite(suite_id), self.page_size)
            .map(|case| case.map(|case| (case.case_id, case)))
            .collect::<Result<_, _>>()?;

        let section_parents: Vec<_> = sections
            .values()
            .map(|section| {
                let parent = section.parent_id.filter(|id| sections.contains_key(id));
                (section.section_id, parent)
            })
            .collect();
        let case_sections: Vec<_> = cases
            .values()
            .map(|case| {
                let section = case.section_id.filter(|id| sections.contains_key(id));
                (case.case_id, section)
            })
            .collect();
        debug!(
            sections = section_parents.len(),
            cases = case_sections.len(),
            "fetched suite contents"
        );

        suite.register_sections(sections.into_values());
        suite.register_cases(cases.into_values());
        for (section_id, parent) in section_parents {
            suite.link_registered_section(section_id, parent)?;
        }
        for (case_id, section) in case_sections {
            suite.link_registered_case(case_id, section)?;
        }
        Ok(suite)
    }

    /// Creates the section at `path` in `suite`, along with any missing
    /// ancestors, and returns its id.
    ///
    /// The path is split on its last `/`. The parent path is resolved with
    /// [`Suite::section_for_path`] and, if absent, created first by the same
    /// procedure. The leaf section is always created, even if a section with
    /// the same path exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a path component is empty, a request fails, or the
    /// created section cannot be linked.
    #[instrument(skip(self, suite), fields(suite_id = %suite.suite_id))]
    pub fn create_section_for_path(
        &self,
        suite: &mut Suite,
        path: &str,
    ) -> Result<SectionId, Error<C::Error>> {
        let (parent_path, name) = match path.rsplit_once('/') {
            Some((parent_path, name)) => (Some(parent_path), name),
            None => (None, path),
        };
        if name.is_empty() || parent_path.is_some_and(str::is_empty) {
            return Err(Error::InvalidPath(path.to_string()));
        }

        let parent_id = match parent_path {
            Some(parent_path) => match suite.section_for_path(parent_path) {
                Some(parent) => Some(parent.section_id),
                None => Some(self.create_section_for_path(suite, parent_path)?),
            },
            None => None,
        };

        let new_section = NewSection {
            suite_id: Some(suite.suite_id),
            name: name.to_string(),
            parent_id,
            description: None,
        };
        let section = self.adapter.add_section(suite.project_id, &new_section)?;
        let section_id = suite.link_section(section, parent_id)?;
        debug!(%section_id, "created section");
        Ok(section_id)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::{
        domain::LinkError,
        remote::{
            Request, RequestStats,
            memory::{MemoryClient, case_record, section_record},
        },
        testing::{PROJECT, SUITE, seeded_client},
    };

    fn adapter(client: MemoryClient) -> Adapter<MemoryClient> {
        Adapter::with_stats(client, RequestStats::new())
    }

    #[test]
    fn builds_linked_suite() {
        let adapter = adapter(seeded_client());

        let suite = Builder::new(&adapter)
            .build_suite(PROJECT, SUITE)
            .expect("suite builds");

        assert_eq!(suite.sections().len(), 4);
        assert_eq!(suite.cases().len(), 3);
        assert!(suite.sections().values().all(Section::is_linked));
        assert!(suite.cases().values().all(Case::is_linked));

        let top = suite.view(SectionId::new(10)).unwrap();
        assert!(top.parent().is_none());
        let children: Vec<_> = top.child_sections().map(|c| c.section_id).collect();
        assert_eq!(children, [SectionId::new(11)]);
        assert_eq!(suite.case_path(CaseId::new(101)).as_deref(), Some("A/B/C"));

        let direct: Vec<_> = suite.direct_cases().map(|c| c.case_id).collect();
        assert_eq!(direct, [CaseId::new(102)]);
        assert_eq!(
            suite.section_for_path("A/B").map(|s| s.section_id),
            Some(SectionId::new(11))
        );
        assert!(suite.section_for_path("A/Bfoobar").is_none());
    }

    #[test_case(1, 5, 4; "page of one")]
    #[test_case(2, 3, 2; "page of two")]
    #[test_case(250, 1, 1; "default page")]
    fn pages_through_listings(page_size: usize, section_pages: u64, case_pages: u64) {
        let adapter = adapter(seeded_client());

        Builder::new(&adapter)
            .with_page_size(NonZeroUsize::new(page_size).unwrap())
            .build_suite(PROJECT, SUITE)
            .expect("suite builds");

        assert_eq!(adapter.stats().get(Request::GetSuite), 1);
        assert_eq!(adapter.stats().get(Request::GetSections), section_pages);
        assert_eq!(adapter.stats().get(Request::GetCases), case_pages);
    }

    #[test]
    fn missing_parents_become_roots() {
        let client = seeded_client();
        client.insert_section(section_record(
            SectionId::new(50),
            SUITE,
            Some(SectionId::new(999)),
            "Orphan",
        ));
        client.insert_case(case_record(
            CaseId::new(500),
            SUITE,
            Some(SectionId::new(998)),
            "Stray",
        ));
        let adapter = adapter(client);

        let suite = Builder::new(&adapter).build_suite(PROJECT, SUITE).expect("suite builds");

        let orphan = suite.section(SectionId::new(50)).unwrap();
        assert!(orphan.is_linked());
        assert_eq!(orphan.parent(), None);
        assert_eq!(suite.section_path(SectionId::new(50)).as_deref(), Some("Orphan"));
        assert!(suite.direct_cases().any(|c| c.case_id == CaseId::new(500)));
    }

    #[test]
    fn self_parented_section_is_rejected() {
        let client = seeded_client();
        client.insert_section(section_record(
            SectionId::new(60),
            SUITE,
            Some(SectionId::new(60)),
            "Loop",
        ));
        let adapter = adapter(client);

        let err = Builder::new(&adapter).build_suite(PROJECT, SUITE).unwrap_err();

        assert!(matches!(err, Error::Link(LinkError::Cycle { .. })));
    }

    #[test]
    fn creates_missing_ancestors() {
        let adapter = adapter(seeded_client());
        let builder = Builder::new(&adapter);
        let mut suite = builder.build_suite(PROJECT, SUITE).unwrap();

        let id = builder
            .create_section_for_path(&mut suite, "A/X/Y")
            .expect("sections are created");

        assert_eq!(suite.section_path(id).as_deref(), Some("A/X/Y"));
        assert_eq!(adapter.stats().get(Request::AddSection), 2);
        let x = suite.section_for_path("A/X").unwrap();
        assert_eq!(x.parent(), Some(SectionId::new(10)));
        assert_eq!(adapter.client().section_record(id).unwrap()["depth"], serde_json::json!(2));
    }

    #[test]
    fn creates_root_section() {
        let adapter = adapter(seeded_client());
        let builder = Builder::new(&adapter);
        let mut suite = builder.build_suite(PROJECT, SUITE).unwrap();

        let id = builder.create_section_for_path(&mut suite, "Z").unwrap();

        assert_eq!(suite.section(id).unwrap().parent(), None);
        assert_eq!(suite.section_path(id).as_deref(), Some("Z"));
    }

    #[test_case(""; "empty")]
    #[test_case("A/"; "trailing slash")]
    #[test_case("/A"; "leading slash")]
    fn rejects_empty_components(path: &str) {
        let adapter = adapter(seeded_client());
        let builder = Builder::new(&adapter);
        let mut suite = builder.build_suite(PROJECT, SUITE).unwrap();
        adapter.stats().reset();

        let err = builder.create_section_for_path(&mut suite, path).unwrap_err();

        assert!(matches!(err, Error::InvalidPath(p) if p == path));
        assert_eq!(adapter.stats().total(), 0);
    }
}
