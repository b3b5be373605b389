pub mod http;

pub use http::HttpProjectStore;

use async_trait::async_trait;
use shared_types::{LoginRequest, LoginResponse, NewTask, Project, ProjectsPageResponse, Task};

use crate::error::RemoteError;

/// The REST collaborator behind the dashboard.
#[async_trait]
pub trait RemoteProjectStore: Send + Sync {
    async fn list_projects(&self, page: u32, page_size: u32) -> Result<ProjectsPageResponse, RemoteError>;
    async fn list_all_projects(&self) -> Result<Vec<Project>, RemoteError>;
    async fn get_project(&self, id: i64) -> Result<Project, RemoteError>;
    async fn update_project(&self, id: i64, project: &Project) -> Result<Project, RemoteError>;

    /// Every task of every project; callers filter by `project_id`.
    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError>;
    async fn create_task(&self, task: &NewTask) -> Result<Task, RemoteError>;

    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, RemoteError>;
}
