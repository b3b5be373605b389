//! Fixtures and an in-memory `RemoteProjectStore` for unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use shared_types::{
    LoginRequest, LoginResponse, NewTask, Project, ProjectsPageResponse, PaginatedProjects, Task,
    User, UserRole,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::error::RemoteError;
use crate::remote::RemoteProjectStore;

pub fn project(id: i64, name: &str, status: &str) -> Project {
    Project {
        id,
        name: name.to_string(),
        status: status.to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        progress: 0,
        budget: 1000.0,
    }
}

pub fn project_with_progress(id: i64, progress: i32) -> Project {
    Project {
        progress,
        ..project(id, &format!("Project {}", id), "Active")
    }
}

pub fn task(id: i64, project_id: i64, title: &str, status: &str, priority: &str) -> Task {
    Task {
        id,
        project_id,
        title: title.to_string(),
        status: status.to_string(),
        priority: priority.to_string(),
        assigned_to: 1,
    }
}

pub fn user(email: &str) -> User {
    User {
        id: "1".to_string(),
        name: "Test User".to_string(),
        email: email.to_string(),
        role: UserRole::Manager,
    }
}

type DispatchHook = Arc<dyn Fn() + Send + Sync>;
type UpdateGate = oneshot::Receiver<Result<Project, RemoteError>>;

#[derive(Default)]
struct FakeData {
    pages: HashMap<u32, (Vec<Project>, Option<u32>)>,
    all_projects: Vec<Project>,
    tasks: Vec<Task>,
    next_task_id: i64,
    create_failure: Option<String>,
    update_failures: HashMap<i64, String>,
    update_gates: HashMap<i64, UpdateGate>,
    credentials: Option<(String, String)>,
}

/// Scripted remote store. Every call counts as dispatched before it does
/// anything else, and runs the `on_dispatch` hook with no locks held.
pub struct FakeRemote {
    data: Mutex<FakeData>,
    dispatched: AtomicUsize,
    hook: Mutex<Option<DispatchHook>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(FakeData {
                next_task_id: 100,
                ..Default::default()
            }),
            dispatched: AtomicUsize::new(0),
            hook: Mutex::new(None),
        }
    }

    pub fn set_page(&self, page: u32, projects: Vec<Project>, total_pages: Option<u32>) {
        self.data.lock().unwrap().pages.insert(page, (projects, total_pages));
    }

    pub fn set_all_projects(&self, projects: Vec<Project>) {
        self.data.lock().unwrap().all_projects = projects;
    }

    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.data.lock().unwrap().tasks = tasks;
    }

    pub fn accept_login(&self, email: &str, password: &str) {
        self.data.lock().unwrap().credentials = Some((email.to_string(), password.to_string()));
    }

    pub fn fail_next_create(&self, message: &str) {
        self.data.lock().unwrap().create_failure = Some(message.to_string());
    }

    pub fn assign_next_task_id(&self, id: i64) {
        self.data.lock().unwrap().next_task_id = id;
    }

    pub fn fail_next_update(&self, id: i64, message: &str) {
        self.data
            .lock()
            .unwrap()
            .update_failures
            .insert(id, message.to_string());
    }

    /// Hold the next update of `id` until the returned sender resolves it.
    pub fn gate_update(&self, id: i64) -> oneshot::Sender<Result<Project, RemoteError>> {
        let (tx, rx) = oneshot::channel();
        self.data.lock().unwrap().update_gates.insert(id, rx);
        tx
    }

    pub fn on_dispatch(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.hook.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    fn dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
        let hook = self.hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn server_error(message: String) -> RemoteError {
        RemoteError::Status {
            status: 500,
            message,
        }
    }
}

#[async_trait]
impl RemoteProjectStore for FakeRemote {
    async fn list_projects(&self, page: u32, _page_size: u32) -> Result<ProjectsPageResponse, RemoteError> {
        self.dispatch();
        let data = self.data.lock().unwrap();
        let (projects, pages) = data.pages.get(&page).cloned().unwrap_or_default();
        Ok(match pages {
            Some(pages) => ProjectsPageResponse::Paginated(PaginatedProjects {
                first: Some(1),
                prev: (page > 1).then(|| page - 1),
                next: (page < pages).then(|| page + 1),
                last: Some(pages),
                pages: Some(pages),
                items: None,
                data: projects,
            }),
            None => ProjectsPageResponse::Bare(projects),
        })
    }

    async fn list_all_projects(&self) -> Result<Vec<Project>, RemoteError> {
        self.dispatch();
        Ok(self.data.lock().unwrap().all_projects.clone())
    }

    async fn get_project(&self, id: i64) -> Result<Project, RemoteError> {
        self.dispatch();
        let data = self.data.lock().unwrap();
        data.all_projects
            .iter()
            .chain(data.pages.values().flat_map(|(projects, _)| projects.iter()))
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RemoteError::Status {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn update_project(&self, id: i64, project: &Project) -> Result<Project, RemoteError> {
        self.dispatch();
        let (failure, gate) = {
            let mut data = self.data.lock().unwrap();
            (data.update_failures.remove(&id), data.update_gates.remove(&id))
        };

        if let Some(gate) = gate {
            return gate
                .await
                .unwrap_or_else(|_| Err(RemoteError::Transport("gate dropped".to_string())));
        }
        match failure {
            Some(message) => Err(Self::server_error(message)),
            None => Ok(project.clone()),
        }
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, RemoteError> {
        self.dispatch();
        Ok(self.data.lock().unwrap().tasks.clone())
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, RemoteError> {
        self.dispatch();
        let mut data = self.data.lock().unwrap();
        if let Some(message) = data.create_failure.take() {
            return Err(Self::server_error(message));
        }
        let id = data.next_task_id;
        data.next_task_id += 1;
        let created = task.clone().with_id(id);
        data.tasks.push(created.clone());
        Ok(created)
    }

    async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, RemoteError> {
        self.dispatch();
        let data = self.data.lock().unwrap();
        match &data.credentials {
            Some((email, password))
                if *email == credentials.email && *password == credentials.password =>
            {
                Ok(LoginResponse {
                    access_token: format!("token-{}", email),
                    user: user(email),
                })
            }
            _ => Err(RemoteError::Status {
                status: 401,
                message: "Invalid credentials".to_string(),
            }),
        }
    }
}
