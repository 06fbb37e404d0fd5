use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// A kind of request issued to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Request {
    /// Fetch one project.
    GetProject,
    /// Fetch a page of projects.
    GetProjects,
    /// Fetch one suite.
    GetSuite,
    /// Fetch the suites of a project.
    GetSuites,
    /// Fetch one section.
    GetSection,
    /// Fetch a page of sections.
    GetSections,
    /// Create a section.
    AddSection,
    /// Re-parent a section.
    MoveSection,
    /// Delete a section.
    DeleteSection,
    /// Fetch one case.
    GetCase,
    /// Fetch a page of cases.
    GetCases,
    /// Create a case.
    AddCase,
    /// Update a case.
    UpdateCase,
    /// Delete a case.
    DeleteCase,
    /// Fetch the custom case field definitions.
    GetCaseFields,
    /// Fetch the case types.
    GetCaseTypes,
}

impl Request {
    /// Every request kind, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::GetProject,
        Self::GetProjects,
        Self::GetSuite,
        Self::GetSuites,
        Self::GetSection,
        Self::GetSections,
        Self::AddSection,
        Self::MoveSection,
        Self::DeleteSection,
        Self::GetCase,
        Self::GetCases,
        Self::AddCase,
        Self::UpdateCase,
        Self::DeleteCase,
        Self::GetCaseFields,
        Self::GetCaseTypes,
    ];

    /// The name of the remote endpoint, e.g. `get_cases`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetProject => "get_project",
            Self::GetProjects => "get_projects",
            Self::GetSuite => "get_suite",
            Self::GetSuites => "get_suites",
            Self::GetSection => "get_section",
            Self::GetSections => "get_sections",
            Self::AddSection => "add_section",
            Self::MoveSection => "move_section",
            Self::DeleteSection => "delete_section",
            Self::GetCase => "get_case",
            Self::GetCases => "get_cases",
            Self::AddCase => "add_case",
            Self::UpdateCase => "update_case",
            Self::DeleteCase => "delete_case",
            Self::GetCaseFields => "get_case_fields",
            Self::GetCaseTypes => "get_case_types",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts the requests issued to the remote service, per [`Request`] kind.
///
/// Clones share the same counters. Pass an instance to
/// [`Adapter::with_stats`](crate::remote::Adapter::with_stats) to count one
/// adapter in isolation, or rely on [`RequestStats::shared`], which every
/// adapter uses by default.
#[derive(Debug, Clone, Default)]
pub struct RequestStats {
    counters: Arc<[AtomicU64; Request::ALL.len()]>,
}

impl RequestStats {
    /// Creates a fresh set of counters, all zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide counters used when no instance is injected.
    #[must_use]
    pub fn shared() -> Self {
        static SHARED: OnceLock<RequestStats> = OnceLock::new();
        SHARED.get_or_init(Self::new).clone()
    }

    /// Adds one to the counter of `request`.
    pub fn increment(&self, request: Request) {
        self.counters[request.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// The current count of `request`.
    #[must_use]
    pub fn get(&self, request: Request) -> u64 {
        self.counters[request.index()].load(Ordering::Relaxed)
    }

    /// The sum of all counters.
    #[must_use]
    pub fn total(&self) -> u64 {
        Request::ALL.iter().map(|&request| self.get(request)).sum()
    }

    /// Sets every counter back to zero.
    pub fn reset(&self) {
        for counter in self.counters.iter() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// A copy of every counter, keyed by request kind.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<Request, u64> {
        Request::ALL
            .iter()
            .map(|&request| (request, self.get(request)))
            .collect()
    }

    /// Whether both handles share the same counters.
    #[must_use]
    pub fn same_counters(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.counters, &other.counters)
    }
}
