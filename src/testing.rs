//! Fixtures shared by the unit tests.

use crate::{
    domain::{Case, CaseId, ProjectId, Section, SectionId, Suite, SuiteId},
    remote::memory::{MemoryClient, case_record, project_record, section_record, suite_record},
};

pub const PROJECT: ProjectId = ProjectId::new(1);
pub const SUITE: SuiteId = SuiteId::new(1);

pub fn empty_suite() -> Suite {
    Suite::from_data(&suite_record(SUITE, PROJECT, "Master")).expect("fixture suite decodes")
}

pub fn section(id: u64, parent: Option<u64>, name: &str) -> Section {
    Section::from_data(&section_record(
        SectionId::new(id),
        SUITE,
        parent.map(SectionId::new),
        name,
    ))
    .expect("fixture section decodes")
}

pub fn case(id: u64, section: Option<u64>) -> Case {
    Case::from_data(&case_record(
        CaseId::new(id),
        SUITE,
        section.map(SectionId::new),
        &format!("Case {id}"),
    ))
    .expect("fixture case decodes")
}

/// A suite shaped like
///
/// ```text
/// A (10)
/// └── B (11)        case 100
///     └── C (12)    case 101
/// D (13)
/// case 102 (no section)
/// ```
pub fn linked_suite() -> Suite {
    let mut suite = empty_suite();
    for (id, parent, name) in [
        (10, None, "A"),
        (11, Some(10), "B"),
        (12, Some(11), "C"),
        (13, None, "D"),
    ] {
        suite
            .link_section(section(id, parent, name), parent.map(SectionId::new))
            .expect("fixture section links");
    }
    for (id, section_id) in [(100, Some(11)), (101, Some(12)), (102, None)] {
        suite
            .link_case(case(id, section_id), section_id.map(SectionId::new))
            .expect("fixture case links");
    }
    suite
}

/// A memory client seeded with the same hierarchy as [`linked_suite`].
pub fn seeded_client() -> MemoryClient {
    let client = MemoryClient::new();
    client.insert_project(project_record(PROJECT, "Payments"));
    client.insert_suite(suite_record(SUITE, PROJECT, "Master"));
    for (id, parent, name, depth) in [
        (10, None, "A", 0),
        (11, Some(10), "B", 1),
        (12, Some(11), "C", 2),
        (13, None, "D", 0),
    ] {
        let mut record =
            section_record(SectionId::new(id), SUITE, parent.map(SectionId::new), name);
        record.insert("depth".into(), depth.into());
        client.insert_section(record);
    }
    for (id, section_id) in [(100, Some(11)), (101, Some(12)), (102, None)] {
        client.insert_case(case_record(
            CaseId::new(id),
            SUITE,
            section_id.map(SectionId::new),
            &format!("Case {id}"),
        ));
    }
    client
}
