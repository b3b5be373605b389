//! Read side: pulls server collections into the cache and the project store.
//!
//! Page fetches are sequenced. Each request takes a ticket, and a response is
//! only applied to the project store if its ticket is still the newest one,
//! so a slow response for page 1 cannot overwrite page 2 after the user moved
//! on. A stale response is still cached under its page key, unless a newer
//! request for that same page was issued after it.

use shared_types::{Project, ProjectsPageResponse, Task};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::CacheKey;
use crate::error::{ClientError, RemoteError, Result};
use crate::remote::RemoteProjectStore;
use crate::state::SharedState;
use crate::stats::ProjectStats;
use crate::store::tasks_for_project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Applied { page: u32, total_pages: Option<u32> },
    /// A newer page request was issued before this one resolved
    Discarded { page: u32 },
}

pub struct Fetcher {
    remote: Arc<dyn RemoteProjectStore>,
    state: SharedState,
    page_size: u32,
    latest: AtomicU64,
    /// Newest ticket issued per page
    page_latest: Mutex<HashMap<u32, u64>>,
}

impl Fetcher {
    pub fn new(remote: Arc<dyn RemoteProjectStore>, state: SharedState, page_size: u32) -> Self {
        Self {
            remote,
            state,
            page_size,
            latest: AtomicU64::new(0),
            page_latest: Mutex::new(HashMap::new()),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Register a request for `page`; it supersedes every earlier ticket.
    pub fn begin_page(&self, page: u32) -> FetchTicket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.page_latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(page, seq);
        self.state.with(|state| {
            state.current_page = page;
            state.projects.set_loading(true);
        });
        FetchTicket { seq, page }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.seq
    }

    /// Whether no later request was issued for the same page.
    fn is_newest_for_page(&self, ticket: &FetchTicket) -> bool {
        let page_latest = self.page_latest.lock().unwrap_or_else(|e| e.into_inner());
        page_latest.get(&ticket.page).map_or(true, |seq| *seq <= ticket.seq)
    }

    /// Apply the response for `ticket`.
    pub fn complete_page(
        &self,
        ticket: FetchTicket,
        response: std::result::Result<ProjectsPageResponse, RemoteError>,
    ) -> Result<PageOutcome> {
        let current = self.is_current(&ticket);
        let cacheable = current || self.is_newest_for_page(&ticket);
        let key = CacheKey::ProjectsPage(ticket.page);

        match response {
            Ok(response) => {
                let total_pages = response.total_pages();
                let projects = response.into_projects();
                self.state.with(|state| {
                    if cacheable {
                        state.project_cache.insert(key, projects.clone());
                    }
                    if current {
                        state.projects.set_projects(projects);
                        if total_pages.is_some() {
                            state.total_pages = total_pages;
                        }
                    }
                });
                if current {
                    Ok(PageOutcome::Applied {
                        page: ticket.page,
                        total_pages,
                    })
                } else {
                    tracing::debug!("Discarding stale response for page {}", ticket.page);
                    Ok(PageOutcome::Discarded { page: ticket.page })
                }
            }
            Err(error) if current => {
                tracing::error!("Failed to fetch projects page {}: {}", ticket.page, error);
                self.state
                    .with(|state| state.projects.set_error(error.to_string()));
                Err(ClientError::Fetch(error))
            }
            Err(error) => {
                tracing::debug!("Ignoring failure of superseded page {} fetch: {}", ticket.page, error);
                Ok(PageOutcome::Discarded { page: ticket.page })
            }
        }
    }

    /// Load listing page `page` into the project store, serving a fresh
    /// cached copy when there is one.
    pub async fn load_page(&self, page: u32) -> Result<PageOutcome> {
        let ticket = self.begin_page(page);

        let cached = self.state.with(|state| {
            state
                .project_cache
                .fresh(&CacheKey::ProjectsPage(page))
                .map(<[Project]>::to_vec)
        });
        if let Some(projects) = cached {
            tracing::debug!("Serving page {} from cache", page);
            return self.complete_page(ticket, Ok(ProjectsPageResponse::Bare(projects)));
        }

        let response = self.remote.list_projects(page, self.page_size).await;
        self.complete_page(ticket, response)
    }

    /// Refetch the current page if a mutation marked it stale.
    pub async fn refresh_current_page(&self) -> Result<Option<PageOutcome>> {
        let (page, stale) = self.state.with(|state| {
            let page = state.current_page;
            (page, state.project_cache.is_stale(&CacheKey::ProjectsPage(page)))
        });
        if !stale {
            return Ok(None);
        }
        self.load_page(page).await.map(Some)
    }

    /// Every project, for the dashboard summary.
    pub async fn load_all_projects(&self) -> Result<Vec<Project>> {
        if let Some(projects) = self.cached(CacheKey::AllProjects) {
            return Ok(projects);
        }

        let projects = self
            .remote
            .list_all_projects()
            .await
            .map_err(ClientError::Fetch)?;
        self.state.with(|state| {
            state
                .project_cache
                .insert(CacheKey::AllProjects, projects.clone())
        });
        Ok(projects)
    }

    pub async fn load_stats(&self) -> Result<ProjectStats> {
        let projects = self.load_all_projects().await?;
        Ok(ProjectStats::from_projects(&projects))
    }

    pub async fn load_project(&self, id: i64) -> Result<Project> {
        if let Some(project) = self.cached(CacheKey::Project(id)).and_then(|mut p| p.pop()) {
            return Ok(project);
        }

        let project = self.remote.get_project(id).await.map_err(|e| {
            tracing::error!("Failed to fetch project {}: {}", id, e);
            ClientError::Fetch(e)
        })?;
        self.state.with(|state| {
            state
                .project_cache
                .insert(CacheKey::Project(id), vec![project.clone()])
        });
        Ok(project)
    }

    /// Tasks of one project. The API only serves the global collection, so
    /// the filtering by `project_id` happens here.
    pub async fn load_project_tasks(&self, project_id: i64) -> Result<Vec<Task>> {
        let key = CacheKey::ProjectTasks(project_id);
        let cached = self
            .state
            .with(|state| state.task_cache.fresh(&key).map(<[Task]>::to_vec));
        if let Some(tasks) = cached {
            return Ok(tasks);
        }

        let all_tasks = self.remote.list_tasks().await.map_err(|e| {
            tracing::error!("Failed to fetch tasks: {}", e);
            ClientError::Fetch(e)
        })?;
        let tasks = tasks_for_project(&all_tasks, project_id);
        self.state
            .with(|state| state.task_cache.insert(key, tasks.clone()));
        Ok(tasks)
    }

    fn cached(&self, key: CacheKey) -> Option<Vec<Project>> {
        self.state
            .with(|state| state.project_cache.fresh(&key).map(<[Project]>::to_vec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DashboardState;
    use crate::testing::{project, task, FakeRemote};
    use chrono::Duration;

    fn setup(remote: Arc<FakeRemote>) -> (Fetcher, SharedState) {
        let state = SharedState::new(DashboardState::new(Duration::seconds(30)));
        (Fetcher::new(remote, state.clone(), 10), state)
    }

    fn page_of(ids: &[i64]) -> ProjectsPageResponse {
        ProjectsPageResponse::Bare(ids.iter().map(|id| project(*id, "P", "Active")).collect())
    }

    fn store_ids(state: &SharedState) -> Vec<i64> {
        state.lock().projects.projects().iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_out_of_order_page_responses() {
        let (fetcher, state) = setup(Arc::new(FakeRemote::new()));

        let page_one = fetcher.begin_page(1);
        let page_two = fetcher.begin_page(2);

        let applied = fetcher.complete_page(page_two, Ok(page_of(&[11, 12]))).unwrap();
        assert_eq!(applied, PageOutcome::Applied { page: 2, total_pages: None });

        let late = fetcher.complete_page(page_one, Ok(page_of(&[1, 2]))).unwrap();
        assert_eq!(late, PageOutcome::Discarded { page: 1 });

        assert_eq!(store_ids(&state), vec![11, 12]);
        let guard = state.lock();
        assert_eq!(guard.current_page, 2);
        assert_eq!(guard.project_cache.get(&CacheKey::ProjectsPage(1)).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_older_response_for_same_page_does_not_replace_newer() {
        let remote = Arc::new(FakeRemote::new());
        let (fetcher, state) = setup(remote.clone());

        let older = fetcher.begin_page(1);
        let newer = fetcher.begin_page(1);
        fetcher
            .complete_page(newer, Ok(ProjectsPageResponse::Bare(vec![project(1, "Fresh", "Active")])))
            .unwrap();
        let late = fetcher
            .complete_page(older, Ok(ProjectsPageResponse::Bare(vec![project(1, "Old", "Active")])))
            .unwrap();
        assert_eq!(late, PageOutcome::Discarded { page: 1 });

        let cached_name = |state: &SharedState| {
            state.lock().project_cache.get(&CacheKey::ProjectsPage(1)).unwrap()[0]
                .name
                .clone()
        };
        assert_eq!(cached_name(&state), "Fresh");

        // served from cache, so it must still be the newer copy
        fetcher.load_page(1).await.unwrap();
        assert_eq!(remote.dispatched(), 0);
        assert_eq!(state.lock().projects.get(1).unwrap().name, "Fresh");
    }

    #[test]
    fn test_fetch_error_sets_flag_without_touching_data() {
        let (fetcher, state) = setup(Arc::new(FakeRemote::new()));
        let ticket = fetcher.begin_page(1);
        fetcher.complete_page(ticket, Ok(page_of(&[1]))).unwrap();

        let ticket = fetcher.begin_page(2);
        assert!(state.lock().projects.is_loading());
        let err = fetcher
            .complete_page(ticket, Err(RemoteError::Transport("offline".to_string())))
            .unwrap_err();

        assert!(matches!(err, ClientError::Fetch(_)));
        let guard = state.lock();
        assert_eq!(guard.projects.error(), Some("Request failed: offline"));
        assert!(!guard.projects.is_loading());
        assert_eq!(guard.projects.projects().len(), 1);
    }

    #[test]
    fn test_superseded_failure_is_ignored() {
        let (fetcher, state) = setup(Arc::new(FakeRemote::new()));
        let stale = fetcher.begin_page(1);
        let fresh = fetcher.begin_page(2);
        fetcher.complete_page(fresh, Ok(page_of(&[5]))).unwrap();

        let outcome = fetcher
            .complete_page(stale, Err(RemoteError::Transport("timeout".to_string())))
            .unwrap();
        assert_eq!(outcome, PageOutcome::Discarded { page: 1 });
        assert_eq!(state.lock().projects.error(), None);
    }

    #[tokio::test]
    async fn test_load_page_keeps_active_filters() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_page(
            3,
            vec![project(21, "Alpha", "Active"), project(22, "Beta", "Completed")],
            Some(4),
        );
        let (fetcher, state) = setup(remote.clone());
        state.with(|s| s.projects.set_status_filter("completed"));

        let outcome = fetcher.load_page(3).await.unwrap();
        assert_eq!(outcome, PageOutcome::Applied { page: 3, total_pages: Some(4) });

        let guard = state.lock();
        assert_eq!(guard.total_pages, Some(4));
        let visible: Vec<i64> = guard.projects.filtered_projects().iter().map(|p| p.id).collect();
        assert_eq!(visible, vec![22]);
    }

    #[tokio::test]
    async fn test_fresh_pages_are_served_from_cache() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_page(1, vec![project(1, "Alpha", "Active")], None);
        let (fetcher, state) = setup(remote.clone());

        fetcher.load_page(1).await.unwrap();
        fetcher.load_page(1).await.unwrap();
        assert_eq!(remote.dispatched(), 1);

        state.with(|s| s.project_cache.invalidate(&CacheKey::ProjectsPage(1)));
        assert!(fetcher.refresh_current_page().await.unwrap().is_some());
        assert_eq!(remote.dispatched(), 2);
        assert!(fetcher.refresh_current_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_project_tasks_are_filtered_client_side() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_tasks(vec![
            task(1, 7, "A", "Pending", "High"),
            task(2, 8, "B", "Pending", "Low"),
            task(3, 7, "C", "Completed", "Low"),
        ]);
        let (fetcher, state) = setup(remote.clone());

        let tasks = fetcher.load_project_tasks(7).await.unwrap();
        assert_eq!(tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(
            state.lock().task_cache.get(&CacheKey::ProjectTasks(7)).unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_stats_from_all_projects() {
        let remote = Arc::new(FakeRemote::new());
        remote.set_all_projects(vec![
            project(1, "Alpha", "Active"),
            project(2, "Beta", "Completed"),
        ]);
        let (fetcher, _) = setup(remote.clone());

        let stats = fetcher.load_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);

        let project = fetcher.load_project(2).await.unwrap();
        assert_eq!(project.name, "Beta");
        assert!(fetcher.load_project(99).await.is_err());
    }
}
