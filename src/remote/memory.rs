//! A [`Client`] that keeps every record in memory.
//!
//! It behaves like the remote service closely enough for offline use, tests
//! and benchmarks: ids are assigned on creation, section depth follows the
//! parent chain, hard deletes cascade and soft deletes flag cases. Every
//! mutating request is recorded in a call log.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet},
};

use chrono::Utc;
use serde_json::{Value, json};
use thiserror::Error;

use crate::{
    domain::{CaseId, ProjectId, Record, SectionId, SuiteId},
    remote::{CaseFilter, Client, NewSection, Request},
};

/// Errors reported by [`MemoryClient`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// The requested entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of entity, e.g. `"section"`.
        kind: &'static str,
        /// The id that was looked up.
        id: u64,
    },
    /// A failure scheduled with [`MemoryClient::fail_next`].
    #[error("injected failure for {0}")]
    Injected(Request),
    /// The request carried an invalid value.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// One mutating request received by a [`MemoryClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// The kind of request.
    pub request: Request,
    /// Id of the entity the request targeted (the parent section for
    /// `add_section`/`add_case`, `0` for a root section).
    pub target: u64,
}

impl Call {
    /// A call of `request` targeting `target`.
    #[must_use]
    pub const fn new(request: Request, target: u64) -> Self {
        Self { request, target }
    }
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    projects: BTreeMap<u64, Record>,
    suites: BTreeMap<u64, Record>,
    sections: BTreeMap<u64, Record>,
    cases: BTreeMap<u64, Record>,
    case_fields: Vec<Record>,
    case_types: Vec<Record>,
    calls: Vec<Call>,
    failures: BTreeSet<Request>,
}

/// An in-memory stand-in for the remote service.
#[derive(Debug, Default)]
pub struct MemoryClient {
    state: RefCell<State>,
}

impl MemoryClient {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a project record as is.
    pub fn insert_project(&self, record: Record) {
        self.insert(record, |state| &mut state.projects);
    }

    /// Stores a suite record as is.
    pub fn insert_suite(&self, record: Record) {
        self.insert(record, |state| &mut state.suites);
    }

    /// Stores a section record as is.
    pub fn insert_section(&self, record: Record) {
        self.insert(record, |state| &mut state.sections);
    }

    /// Stores a case record as is.
    pub fn insert_case(&self, record: Record) {
        self.insert(record, |state| &mut state.cases);
    }

    /// Stores a case field definition.
    pub fn insert_case_field(&self, record: Record) {
        self.state.borrow_mut().case_fields.push(record);
    }

    /// Stores a case type.
    pub fn insert_case_type(&self, record: Record) {
        self.state.borrow_mut().case_types.push(record);
    }

    fn insert(&self, record: Record, table: impl FnOnce(&mut State) -> &mut BTreeMap<u64, Record>) {
        let id = id_of(&record);
        let mut state = self.state.borrow_mut();
        state.next_id = state.next_id.max(id);
        table(&mut *state).insert(id, record);
    }

    /// Makes the next request of the given kind fail with
    /// [`MemoryError::Injected`].
    pub fn fail_next(&self, request: Request) {
        self.state.borrow_mut().failures.insert(request);
    }

    /// The mutating requests received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// The number of mutating requests of one kind received so far.
    #[must_use]
    pub fn count(&self, request: Request) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.request == request)
            .count()
    }

    /// The stored record of a section.
    #[must_use]
    pub fn section_record(&self, section_id: SectionId) -> Option<Record> {
        self.state.borrow().sections.get(&section_id.get()).cloned()
    }

    /// The stored record of a case.
    #[must_use]
    pub fn case_record(&self, case_id: CaseId) -> Option<Record> {
        self.state.borrow().cases.get(&case_id.get()).cloned()
    }

    /// Fails if a failure was scheduled for `request`, then logs mutating
    /// requests.
    fn receive(&self, request: Request, target: Option<u64>) -> Result<(), MemoryError> {
        let mut state = self.state.borrow_mut();
        if state.failures.remove(&request) {
            return Err(MemoryError::Injected(request));
        }
        if let Some(target) = target {
            state.calls.push(Call::new(request, target));
        }
        Ok(())
    }
}

impl State {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn suite_project(&self, suite_id: u64) -> Option<u64> {
        self.suites.get(&suite_id).and_then(|suite| u64_field(suite, "project_id"))
    }

    fn section(&self, section_id: u64) -> Result<&Record, MemoryError> {
        self.sections
            .get(&section_id)
            .ok_or(MemoryError::NotFound { kind: "section", id: section_id })
    }

    fn case_mut(&mut self, case_id: u64) -> Result<&mut Record, MemoryError> {
        self.cases
            .get_mut(&case_id)
            .ok_or(MemoryError::NotFound { kind: "case", id: case_id })
    }

    fn child_sections(&self, section_id: u64) -> Vec<u64> {
        self.sections
            .iter()
            .filter(|(_, record)| u64_field(record, "parent_id") == Some(section_id))
            .map(|(&id, _)| id)
            .collect()
    }

    /// The section and all of its descendants.
    fn subtree(&self, section_id: u64) -> Vec<u64> {
        let mut subtree = vec![section_id];
        let mut index = 0;
        while let Some(&id) = subtree.get(index) {
            subtree.extend(self.child_sections(id));
            index += 1;
        }
        subtree
    }

    fn set_depth(&mut self, section_id: u64, depth: u64) {
        for id in self.subtree(section_id) {
            let parent_depth = self
                .sections
                .get(&id)
                .and_then(|record| u64_field(record, "parent_id"))
                .filter(|_| id != section_id)
                .and_then(|parent| self.sections.get(&parent))
                .and_then(|record| u64_field(record, "depth"));
            let depth = parent_depth.map_or(depth, |d| d + 1);
            if let Some(record) = self.sections.get_mut(&id) {
                record.insert("depth".into(), json!(depth));
            }
        }
    }
}

fn id_of(record: &Record) -> u64 {
    u64_field(record, "id").unwrap_or_default()
}

fn u64_field(record: &Record, key: &str) -> Option<u64> {
    record.get(key).and_then(Value::as_u64)
}

fn page(records: impl Iterator<Item = Record>, limit: usize, offset: usize) -> Vec<Record> {
    records.skip(offset).take(limit).collect()
}

impl Client for MemoryClient {
    type Error = MemoryError;

    fn get_project(&self, project_id: ProjectId) -> Result<Record, Self::Error> {
        self.receive(Request::GetProject, None)?;
        self.state
            .borrow()
            .projects
            .get(&project_id.get())
            .cloned()
            .ok_or(MemoryError::NotFound { kind: "project", id: project_id.get() })
    }

    fn get_projects(
        &self,
        is_completed: Option<bool>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Record>, Self::Error> {
        self.receive(Request::GetProjects, None)?;
        let state = self.state.borrow();
        let projects = state.projects.values().filter(|project| {
            is_completed.is_none_or(|wanted| {
                project.get("is_completed").and_then(Value::as_bool).unwrap_or(false) == wanted
            })
        });
        Ok(page(projects.cloned(), limit, offset))
    }

    fn get_suite(&self, suite_id: SuiteId) -> Result<Record, Self::Error> {
        self.receive(Request::GetSuite, None)?;
        self.state
            .borrow()
            .suites
            .get(&suite_id.get())
            .cloned()
            .ok_or(MemoryError::NotFound { kind: "suite", id: suite_id.get() })
    }

    fn get_suites(&self, project_id: ProjectId) -> Result<Vec<Record>, Self::Error> {
        self.receive(Request::GetSuites, None)?;
        let state = self.state.borrow();
        Ok(state
            .suites
            .values()
            .filter(|suite| u64_field(suite, "project_id") == Some(project_id.get()))
            .cloned()
            .collect())
    }

    fn get_section(&self, section_id: SectionId) -> Result<Record, Self::Error> {
        self.receive(Request::GetSection, None)?;
        self.state.borrow().section(section_id.get()).cloned()
    }

    fn get_sections(
        &self,
        project_id: ProjectId,
        suite_id: Option<SuiteId>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Record>, Self::Error> {
        self.receive(Request::GetSections, None)?;
        let state = self.state.borrow();
        let sections = state.sections.values().filter(|section| {
            let Some(section_suite) = u64_field(section, "suite_id") else {
                return false;
            };
            state.suite_project(section_suite) == Some(project_id.get())
                && suite_id.is_none_or(|id| id.get() == section_suite)
        });
        Ok(page(sections.cloned(), limit, offset))
    }

    fn add_section(
        &self,
        project_id: ProjectId,
        section: &NewSection,
    ) -> Result<Record, Self::Error> {
        self.receive(
            Request::AddSection,
            Some(section.parent_id.map_or(0, SectionId::get)),
        )?;
        let mut state = self.state.borrow_mut();
        let suite_id = match section.suite_id {
            Some(suite_id) => suite_id.get(),
            None => state
                .suites
                .iter()
                .find(|(_, suite)| u64_field(suite, "project_id") == Some(project_id.get()))
                .map(|(&id, _)| id)
                .ok_or(MemoryError::NotFound { kind: "project", id: project_id.get() })?,
        };
        if state.suite_project(suite_id) != Some(project_id.get()) {
            return Err(MemoryError::NotFound { kind: "suite", id: suite_id });
        }
        if section.name.is_empty() {
            return Err(MemoryError::Invalid {
                field: "name",
                reason: "must not be empty".into(),
            });
        }
        let (depth, siblings) = match section.parent_id {
            Some(parent) => {
                let parent_depth =
                    u64_field(state.section(parent.get())?, "depth").unwrap_or_default();
                (parent_depth + 1, state.child_sections(parent.get()).len())
            }
            None => (
                0,
                state
                    .sections
                    .values()
                    .filter(|s| s.get("parent_id").is_none_or(Value::is_null))
                    .count(),
            ),
        };

        let id = state.allocate_id();
        let mut record = section_record(
            SectionId::new(id),
            SuiteId::new(suite_id),
            section.parent_id,
            &section.name,
        );
        record.insert("depth".into(), json!(depth));
        record.insert("display_order".into(), json!(siblings + 1));
        record.insert("description".into(), json!(section.description));
        state.sections.insert(id, record.clone());
        Ok(record)
    }

    fn move_section(
        &self,
        section_id: SectionId,
        parent_id: Option<SectionId>,
    ) -> Result<Record, Self::Error> {
        self.receive(Request::MoveSection, Some(section_id.get()))?;
        let mut state = self.state.borrow_mut();
        state.section(section_id.get())?;
        let depth = match parent_id {
            Some(parent) => {
                if state.subtree(section_id.get()).contains(&parent.get()) {
                    return Err(MemoryError::Invalid {
                        field: "parent_id",
                        reason: format!("section {parent} is inside the moved subtree"),
                    });
                }
                u64_field(state.section(parent.get())?, "depth").unwrap_or_default() + 1
            }
            None => 0,
        };
        if let Some(record) = state.sections.get_mut(&section_id.get()) {
            record.insert("parent_id".into(), json!(parent_id));
        }
        state.set_depth(section_id.get(), depth);
        state.section(section_id.get()).cloned()
    }

    fn delete_section(&self, section_id: SectionId, soft: bool) -> Result<(), Self::Error> {
        self.receive(Request::DeleteSection, Some(section_id.get()))?;
        let mut state = self.state.borrow_mut();
        state.section(section_id.get())?;
        if soft {
            return Ok(());
        }
        let removed = state.subtree(section_id.get());
        for id in &removed {
            state.sections.remove(id);
        }
        state.cases.retain(|_, case| {
            u64_field(case, "section_id").is_none_or(|section| !removed.contains(&section))
        });
        Ok(())
    }

    fn get_case(&self, case_id: CaseId) -> Result<Record, Self::Error> {
        self.receive(Request::GetCase, None)?;
        self.state
            .borrow()
            .cases
            .get(&case_id.get())
            .cloned()
            .ok_or(MemoryError::NotFound { kind: "case", id: case_id.get() })
    }

    fn get_cases(
        &self,
        project_id: ProjectId,
        filter: &CaseFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Record>, Self::Error> {
        self.receive(Request::GetCases, None)?;
        let state = self.state.borrow();
        let cases = state.cases.values().filter(|case| {
            let suite = u64_field(case, "suite_id").unwrap_or_default();
            let title = case.get("title").and_then(Value::as_str).unwrap_or_default();
            let updated = case.get("updated_on").and_then(Value::as_i64).unwrap_or_default();
            state.suite_project(suite) == Some(project_id.get())
                && filter.suite_id.is_none_or(|id| id.get() == suite)
                && filter
                    .section_id
                    .is_none_or(|id| u64_field(case, "section_id") == Some(id.get()))
                && filter.filter.as_deref().is_none_or(|text| title.contains(text))
                && filter.updated_after.is_none_or(|after| updated >= after.timestamp())
        });
        Ok(page(cases.cloned(), limit, offset))
    }

    fn add_case(
        &self,
        section_id: SectionId,
        title: &str,
        fields: &Record,
    ) -> Result<Record, Self::Error> {
        self.receive(Request::AddCase, Some(section_id.get()))?;
        let mut state = self.state.borrow_mut();
        let suite_id = u64_field(state.section(section_id.get())?, "suite_id").unwrap_or_default();

        let id = state.allocate_id();
        let mut record = case_record(
            CaseId::new(id),
            SuiteId::new(suite_id),
            Some(section_id),
            title,
        );
        record.extend(fields.iter().map(|(key, value)| (key.clone(), value.clone())));
        state.cases.insert(id, record.clone());
        Ok(record)
    }

    fn update_case(&self, case_id: CaseId, fields: &Record) -> Result<Record, Self::Error> {
        self.receive(Request::UpdateCase, Some(case_id.get()))?;
        let mut state = self.state.borrow_mut();
        if let Some(section) = fields.get("section_id") {
            let section = section.as_u64().ok_or_else(|| MemoryError::Invalid {
                field: "section_id",
                reason: format!("expected an integer, got {section}"),
            })?;
            state.section(section)?;
        }
        let record = state.case_mut(case_id.get())?;
        record.extend(fields.iter().map(|(key, value)| (key.clone(), value.clone())));
        record.insert("updated_on".into(), json!(Utc::now().timestamp()));
        Ok(record.clone())
    }

    fn delete_case(&self, case_id: CaseId, soft: bool) -> Result<(), Self::Error> {
        self.receive(Request::DeleteCase, Some(case_id.get()))?;
        let mut state = self.state.borrow_mut();
        let record = state.case_mut(case_id.get())?;
        if soft {
            record.insert("is_deleted".into(), json!(1));
        } else {
            state.cases.remove(&case_id.get());
        }
        Ok(())
    }

    fn get_case_fields(&self) -> Result<Vec<Record>, Self::Error> {
        self.receive(Request::GetCaseFields, None)?;
        Ok(self.state.borrow().case_fields.clone())
    }

    fn get_case_types(&self) -> Result<Vec<Record>, Self::Error> {
        self.receive(Request::GetCaseTypes, None)?;
        Ok(self.state.borrow().case_types.clone())
    }
}

fn object(value: Value) -> Record {
    match value {
        Value::Object(record) => record,
        _ => Record::new(),
    }
}

/// A minimal project record in multiple-suite mode.
#[must_use]
pub fn project_record(project_id: ProjectId, name: &str) -> Record {
    object(json!({
        "id": project_id,
        "name": name,
        "url": format!("https://testrail.example/index.php?/projects/overview/{project_id}"),
        "is_completed": false,
        "completed_on": null,
        "suite_mode": 3,
        "show_announcement": false,
        "announcement": null,
    }))
}

/// A minimal suite record.
#[must_use]
pub fn suite_record(suite_id: SuiteId, project_id: ProjectId, name: &str) -> Record {
    object(json!({
        "id": suite_id,
        "project_id": project_id,
        "name": name,
        "description": null,
        "url": format!("https://testrail.example/index.php?/suites/view/{suite_id}"),
        "is_baseline": false,
        "is_completed": false,
        "is_master": true,
        "completed_on": null,
    }))
}

/// A section record at depth 0.
#[must_use]
pub fn section_record(
    section_id: SectionId,
    suite_id: SuiteId,
    parent_id: Option<SectionId>,
    name: &str,
) -> Record {
    object(json!({
        "id": section_id,
        "suite_id": suite_id,
        "parent_id": parent_id,
        "depth": 0,
        "display_order": 1,
        "name": name,
        "description": null,
    }))
}

/// A case record carrying every standard key.
#[must_use]
pub fn case_record(
    case_id: CaseId,
    suite_id: SuiteId,
    section_id: Option<SectionId>,
    title: &str,
) -> Record {
    let now = Utc::now().timestamp();
    object(json!({
        "id": case_id,
        "suite_id": suite_id,
        "section_id": section_id,
        "title": title,
        "created_by": 1,
        "created_on": now,
        "updated_by": 1,
        "updated_on": now,
        "priority_id": 2,
        "template_id": 1,
        "type_id": 6,
        "milestone_id": null,
        "display_order": 1,
        "estimate": null,
        "estimate_forecast": null,
        "refs": null,
        "is_deleted": 0,
    }))
}
