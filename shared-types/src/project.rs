use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::UnknownVariant;

/// Known project status values.
///
/// The wire format keeps `Project::status` as free text; this vocabulary is
/// what the dashboard recognises when comparing case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ProjectStatus {
    #[serde(rename = "Active")]
    Active,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Not Started")]
    NotStarted,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Active,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::Pending,
        ProjectStatus::NotStarted,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Pending => "Pending",
            ProjectStatus::NotStarted => "Not Started",
        }
    }

    /// Case-insensitive lookup of a free-form status string.
    pub fn from_label(value: &str) -> Option<Self> {
        let lowered = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.label().to_lowercase() == lowered)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProjectStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| UnknownVariant {
            kind: "project status",
            value: s.to_string(),
        })
    }
}

/// Project entity as served by the `/projects` endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub progress: i32,
    pub budget: f64,
}

impl Project {
    /// The recognised status, if the free-form value matches the vocabulary.
    pub fn known_status(&self) -> Option<ProjectStatus> {
        ProjectStatus::from_label(&self.status)
    }
}

/// Paginated envelope returned by json-server style backends for
/// `GET /projects?_page=n&_per_page=m`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaginatedProjects {
    pub first: Option<u32>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
    pub last: Option<u32>,
    pub pages: Option<u32>,
    pub items: Option<u32>,
    pub data: Vec<Project>,
}

/// `GET /projects` page responses come either as a bare array or as a
/// paginated envelope depending on the backend version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectsPageResponse {
    Bare(Vec<Project>),
    Paginated(PaginatedProjects),
}

impl ProjectsPageResponse {
    pub fn total_pages(&self) -> Option<u32> {
        match self {
            ProjectsPageResponse::Bare(_) => None,
            ProjectsPageResponse::Paginated(page) => page.pages,
        }
    }

    pub fn into_projects(self) -> Vec<Project> {
        match self {
            ProjectsPageResponse::Bare(projects) => projects,
            ProjectsPageResponse::Paginated(page) => page.data,
        }
    }
}
