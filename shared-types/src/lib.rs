use serde::{Deserialize, Serialize};

pub mod auth;
pub mod project;
pub mod task;

pub use auth::{LoginRequest, LoginResponse, User, UserRole};
pub use project::{PaginatedProjects, Project, ProjectStatus, ProjectsPageResponse};
pub use task::{NewTask, Task, TaskPriority, TaskStatus};

/// Error body returned by the API on failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A vocabulary string that did not match any known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
