use chrono::Duration;
use shared_types::{Project, Task};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::QueryCache;
use crate::store::ProjectListState;

/// Everything the dashboard mirrors from the server.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub projects: ProjectListState,
    pub project_cache: QueryCache<Project>,
    pub task_cache: QueryCache<Task>,
    pub current_page: u32,
    pub total_pages: Option<u32>,
}

impl DashboardState {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            projects: ProjectListState::new(),
            project_cache: QueryCache::new(stale_after),
            task_cache: QueryCache::new(stale_after),
            current_page: 1,
            total_pages: None,
        }
    }
}

/// Cloneable handle to one `DashboardState`.
///
/// The lock is only ever held for synchronous updates, never across an
/// `.await`, so a guard always sees a fully recomputed derived view.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<Mutex<DashboardState>>,
}

impl SharedState {
    pub fn new(state: DashboardState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, DashboardState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the state under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        f(&mut self.lock())
    }
}
