//! Canonical project list with a derived, filtered view.
//!
//! `ProjectListState` is an ordinary value owned by whoever drives the
//! dashboard; every operation that touches the canonical list or the filter
//! criteria recomputes `filtered_projects` before returning, so readers never
//! observe a view that lags its inputs.

pub mod filter;
pub mod tasks;

pub use filter::{apply_filters, FilterCriteria, ALL_STATUSES};
pub use tasks::{tasks_for_project, TaskFilter, TaskStats};

use shared_types::Project;

#[derive(Debug, Clone, Default)]
pub struct ProjectListState {
    projects: Vec<Project>,
    filtered_projects: Vec<Project>,
    criteria: FilterCriteria,
    is_loading: bool,
    error: Option<String>,
}

impl ProjectListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn filtered_projects(&self) -> &[Project] {
        &self.filtered_projects
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn get(&self, id: i64) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    /// Replace the canonical list wholesale, e.g. after a page fetch.
    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
        self.is_loading = false;
        self.error = None;
        self.recompute();
    }

    /// Replace the project with the same id in place.
    ///
    /// Returns `false` and leaves the state untouched when no project has
    /// that id.
    pub fn update_project(&mut self, project: Project) -> bool {
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(slot) => {
                *slot = project;
                self.recompute();
                true
            }
            None => {
                tracing::debug!("Ignoring update for unknown project {}", project.id);
                false
            }
        }
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.criteria.search_query = query.into();
        self.recompute();
    }

    pub fn set_status_filter(&mut self, status: impl Into<String>) {
        self.criteria.status_filter = status.into();
        self.recompute();
    }

    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.recompute();
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.is_loading = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn recompute(&mut self) {
        self.filtered_projects = apply_filters(&self.projects, &self.criteria);
    }
}
