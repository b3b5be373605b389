use serde::{Deserialize, Serialize};
use shared_types::Project;

/// Status filter value meaning "no status restriction".
pub const ALL_STATUSES: &str = "all";

/// User-adjustable criteria applied to the canonical project list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub search_query: String,
    pub status_filter: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            status_filter: ALL_STATUSES.to_string(),
        }
    }
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.search_query.trim().is_empty() && self.status_filter == ALL_STATUSES
    }
}

/// Projects matching `criteria`, in canonical order.
///
/// The search runs before the status restriction: a project survives the
/// search when its lowercase name, its decimal id, or its lowercase status
/// contains the trimmed lowercase query.
pub fn apply_filters(projects: &[Project], criteria: &FilterCriteria) -> Vec<Project> {
    let mut filtered: Vec<Project> = projects.to_vec();

    let query = criteria.search_query.trim().to_lowercase();
    if !query.is_empty() {
        filtered.retain(|project| matches_query(project, &query));
    }

    if criteria.status_filter != ALL_STATUSES {
        let wanted = criteria.status_filter.to_lowercase();
        filtered.retain(|project| project.status.to_lowercase() == wanted);
    }

    filtered
}

fn matches_query(project: &Project, query: &str) -> bool {
    project.name.to_lowercase().contains(query)
        || project.id.to_string().contains(query)
        || project.status.to_lowercase().contains(query)
}
