//! Domain model of the test-management hierarchy.
//!
//! Projects hold suites, suites hold an arena of sections and cases. Entities
//! are decoded from the raw records the remote service returns and linked
//! into a [`Suite`], which enforces the foreign-key invariants between them.

mod case;
pub use case::{CUSTOM_PREFIX, Case, CustomFieldError};

mod case_field;
pub use case_field::{CaseField, CaseFieldType};

mod case_type;
pub use case_type::CaseType;

mod id;
pub use id::{CaseFieldId, CaseId, CaseTypeId, ProjectId, SectionId, SuiteId};

mod link;
pub use link::{Detached, LinkError};

mod project;
pub use project::{Project, SuiteMode};

/// Raw wire records and their conversion errors.
pub mod record;
pub use record::{Record, RecordError};

mod section;
pub use section::Section;

mod section_view;
pub use section_view::SectionView;

mod suite;
pub use suite::Suite;
