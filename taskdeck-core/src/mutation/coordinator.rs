use shared_types::{Project, Task};
use std::sync::Arc;

use super::{Entity, Mutation, Patch, Phase, TempIds};
use crate::cache::CacheKey;
use crate::error::{ClientError, RemoteError, Result};
use crate::notify::{Notice, Notifier};
use crate::remote::RemoteProjectStore;
use crate::state::SharedState;
use crate::validation::{ProjectForm, TaskForm};

pub const PROJECT_UPDATE_FAILED: &str = "Failed to update project. Please try again.";
pub const TASK_CREATE_FAILED: &str = "Failed to add task. Please try again.";

/// How a submitted mutation ended
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome<T> {
    pub phase: Phase,
    /// The server's copy on commit
    pub entity: Option<T>,
    pub editor_open: bool,
    pub notice: Option<String>,
    pub error: Option<RemoteError>,
}

impl<T: Entity> MutationOutcome<T> {
    fn settled(machine: &Mutation<T>, entity: Option<T>, error: Option<RemoteError>) -> Self {
        Self {
            phase: machine.phase(),
            entity,
            editor_open: machine.editor_open(),
            notice: machine.notice().map(str::to_string),
            error,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.phase == Phase::Committed
    }

    /// The confirmed entity, or the remote failure that rolled it back.
    pub fn into_result(self) -> Result<T> {
        match (self.entity, self.error) {
            (Some(entity), _) => Ok(entity),
            (None, Some(error)) => Err(ClientError::Mutation(error)),
            (None, None) => Err(ClientError::Transition(super::TransitionError {
                from: self.phase,
                event: "settle",
            })),
        }
    }
}

/// Runs optimistic writes against the remote store.
///
/// The optimistic patch lands in shared state before the request is sent;
/// the state lock is not held while the request is in flight.
pub struct Coordinator {
    remote: Arc<dyn RemoteProjectStore>,
    state: SharedState,
    notifier: Arc<dyn Notifier>,
    temp_ids: TempIds,
}

impl Coordinator {
    pub fn new(
        remote: Arc<dyn RemoteProjectStore>,
        state: SharedState,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            remote,
            state,
            notifier,
            temp_ids: TempIds::new(),
        }
    }

    /// Save an edited project shown on listing page `page`.
    ///
    /// A form that fails validation returns `ClientError::Validation` without
    /// touching state or the network. Remote failures are not errors here:
    /// they roll back and come back as a `RolledBack` outcome.
    pub async fn submit_project_update(
        &self,
        page: u32,
        form: &ProjectForm,
    ) -> Result<MutationOutcome<Project>> {
        let project = form.validate()?;
        let key = CacheKey::ProjectsPage(page);

        let machine = self.state.with(|state| {
            let current = match state.project_cache.get(&key) {
                Some(cached) => cached.to_vec(),
                None => state.projects.projects().to_vec(),
            };
            let (machine, patched) =
                Mutation::new(key).submit(&current, Patch::Update(project.clone()))?;
            state.project_cache.set_local(key, patched);
            state.projects.update_project(project.clone());
            Ok::<_, ClientError>(machine)
        })?;

        tracing::info!("Updating project {} from page {}", project.id, page);
        let result = self.remote.update_project(project.id, &project).await;

        let outcome = self.state.with(|state| {
            let current = state.project_cache.get(&key).unwrap_or_default().to_vec();
            let outcome = match result {
                Ok(confirmed) => {
                    let (machine, next) = machine.succeed(&current, confirmed.clone())?;
                    state.project_cache.set_local(key, next);
                    state.projects.update_project(confirmed.clone());
                    state
                        .project_cache
                        .insert(CacheKey::Project(confirmed.id), vec![confirmed.clone()]);
                    MutationOutcome::settled(&machine, Some(confirmed), None)
                }
                Err(error) => {
                    tracing::error!("Error updating project {}: {}", project.id, error);
                    let previous = machine
                        .snapshot()
                        .and_then(|snapshot| snapshot.get(project.id))
                        .cloned();
                    let (machine, next) = machine.fail(&current, PROJECT_UPDATE_FAILED)?;
                    state.project_cache.set_local(key, next);
                    if let Some(previous) = previous {
                        state.projects.update_project(previous);
                    }
                    MutationOutcome::settled(&machine, None, Some(error))
                }
            };
            // listings are refetched in the background whatever happened
            state
                .project_cache
                .invalidate_where(CacheKey::is_project_listing);
            Ok::<_, ClientError>(outcome)
        })?;

        self.announce(&outcome);
        Ok(outcome)
    }

    /// Add a task to `project_id`; it shows up at once under a temporary id.
    pub async fn submit_task_create(
        &self,
        project_id: i64,
        form: &TaskForm,
    ) -> Result<MutationOutcome<Task>> {
        let new_task = form.validate(project_id)?;
        let key = CacheKey::ProjectTasks(project_id);
        let optimistic = new_task.clone().with_id(self.temp_ids.next());

        let machine = self.state.with(|state| {
            let current = state.task_cache.get(&key).unwrap_or_default().to_vec();
            let (machine, patched) =
                Mutation::new(key).submit(&current, Patch::Create(optimistic.clone()))?;
            state.task_cache.set_local(key, patched);
            Ok::<_, ClientError>(machine)
        })?;

        tracing::info!(
            "Adding task to project {} (temporary id {})",
            project_id,
            optimistic.id
        );
        let result = self.remote.create_task(&new_task).await;

        let outcome = self.state.with(|state| {
            let current = state.task_cache.get(&key).unwrap_or_default().to_vec();
            let outcome = match result {
                Ok(created) => {
                    let (machine, next) = machine.succeed(&current, created.clone())?;
                    state.task_cache.set_local(key, next);
                    MutationOutcome::settled(&machine, Some(created), None)
                }
                Err(error) => {
                    tracing::error!("Task adding failed for project {}: {}", project_id, error);
                    let (machine, next) = machine.fail(&current, TASK_CREATE_FAILED)?;
                    state.task_cache.set_local(key, next);
                    MutationOutcome::settled(&machine, None, Some(error))
                }
            };
            state.task_cache.invalidate(&key);
            Ok::<_, ClientError>(outcome)
        })?;

        self.announce(&outcome);
        Ok(outcome)
    }

    fn announce<T>(&self, outcome: &MutationOutcome<T>) {
        if let Some(message) = &outcome.notice {
            self.notifier.notify(Notice::error(message.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NoticeQueue;
    use crate::state::DashboardState;
    use crate::testing::{project, project_with_progress, task, FakeRemote};
    use chrono::Duration;
    use std::sync::Mutex;

    fn setup(remote: Arc<FakeRemote>) -> (Coordinator, SharedState, Arc<NoticeQueue>) {
        let state = SharedState::new(DashboardState::new(Duration::seconds(30)));
        let notices = Arc::new(NoticeQueue::new());
        let coordinator = Coordinator::new(remote, state.clone(), notices.clone());
        (coordinator, state, notices)
    }

    fn task_ids(state: &SharedState, project_id: i64) -> Vec<i64> {
        state
            .lock()
            .task_cache
            .get(&CacheKey::ProjectTasks(project_id))
            .unwrap_or_default()
            .iter()
            .map(|t| t.id)
            .collect()
    }

    fn title_form(title: &str) -> TaskForm {
        TaskForm {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_task_create_rolls_back_on_failure() {
        let remote = Arc::new(FakeRemote::new());
        remote.fail_next_create("boom");
        let (coordinator, state, notices) = setup(remote.clone());
        state.with(|s| {
            s.task_cache
                .insert(CacheKey::ProjectTasks(7), vec![task(1, 7, "T1", "Pending", "Low")])
        });

        // what the UI would have rendered while the request was in flight
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (probe_state, probe_seen) = (state.clone(), seen.clone());
        remote.on_dispatch(move || {
            probe_seen.lock().unwrap().push(task_ids(&probe_state, 7));
        });

        let outcome = coordinator
            .submit_task_create(7, &title_form("Optimistic"))
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), &[vec![1, -1]]);
        assert_eq!(outcome.phase, Phase::RolledBack);
        assert!(outcome.editor_open);
        assert_eq!(task_ids(&state, 7), vec![1]);
        assert_eq!(
            notices.drain(),
            vec![Notice::error(TASK_CREATE_FAILED)]
        );
    }

    #[tokio::test]
    async fn test_task_create_commit_replaces_temporary_id() {
        let remote = Arc::new(FakeRemote::new());
        remote.assign_next_task_id(42);
        let (coordinator, state, notices) = setup(remote.clone());
        state.with(|s| {
            s.task_cache
                .insert(CacheKey::ProjectTasks(7), vec![task(1, 7, "T1", "Pending", "Low")])
        });

        let outcome = coordinator
            .submit_task_create(7, &title_form("Confirmed"))
            .await
            .unwrap();

        assert!(outcome.is_committed());
        assert!(!outcome.editor_open);
        assert_eq!(outcome.entity.unwrap().id, 42);
        assert_eq!(task_ids(&state, 7), vec![1, 42]);
        assert!(state.lock().task_cache.is_stale(&CacheKey::ProjectTasks(7)));
        assert!(notices.drain().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_form_never_reaches_remote() {
        let remote = Arc::new(FakeRemote::new());
        let (coordinator, state, _) = setup(remote.clone());

        let err = coordinator
            .submit_task_create(7, &title_form(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let mut form = ProjectForm::from_project(&project_with_progress(1, 10));
        form.progress = Some(150);
        let err = coordinator.submit_project_update(1, &form).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        assert_eq!(remote.dispatched(), 0);
        assert!(state.lock().task_cache.get(&CacheKey::ProjectTasks(7)).is_none());
    }

    #[tokio::test]
    async fn test_project_update_commit_updates_store_and_marks_listings_stale() {
        let remote = Arc::new(FakeRemote::new());
        let (coordinator, state, _) = setup(remote.clone());
        state.with(|s| {
            let page = vec![project_with_progress(1, 10), project_with_progress(2, 20)];
            s.project_cache.insert(CacheKey::ProjectsPage(1), page.clone());
            s.project_cache.insert(CacheKey::AllProjects, page.clone());
            s.projects.set_projects(page);
        });

        let form = ProjectForm::from_project(&project_with_progress(2, 55));
        let outcome = coordinator.submit_project_update(1, &form).await.unwrap();

        assert!(outcome.is_committed());
        let guard = state.lock();
        let progress: Vec<i32> = guard.projects.projects().iter().map(|p| p.progress).collect();
        assert_eq!(progress, vec![10, 55]);
        assert!(guard.project_cache.is_stale(&CacheKey::ProjectsPage(1)));
        assert!(guard.project_cache.is_stale(&CacheKey::AllProjects));
        assert_eq!(guard.project_cache.get(&CacheKey::Project(2)).unwrap()[0].progress, 55);
    }

    #[tokio::test]
    async fn test_project_update_failure_restores_store() {
        let remote = Arc::new(FakeRemote::new());
        remote.fail_next_update(2, "server down");
        let (coordinator, state, notices) = setup(remote.clone());
        state.with(|s| {
            s.projects.set_projects(vec![project(1, "Alpha", "Active"), project(2, "Beta", "Pending")]);
            s.projects.set_status_filter("completed");
        });

        let mut form = ProjectForm::from_project(&project(2, "Beta", "Pending"));
        form.status = "Completed".to_string();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (probe_state, probe_seen) = (state.clone(), seen.clone());
        remote.on_dispatch(move || {
            let guard = probe_state.lock();
            let ids: Vec<i64> = guard.projects.filtered_projects().iter().map(|p| p.id).collect();
            probe_seen.lock().unwrap().push(ids);
        });

        let outcome = coordinator.submit_project_update(1, &form).await.unwrap();

        assert_eq!(seen.lock().unwrap().as_slice(), &[vec![2]]);
        assert_eq!(outcome.phase, Phase::RolledBack);
        assert!(outcome.editor_open);
        assert!(outcome.error.is_some());

        let guard = state.lock();
        assert_eq!(guard.projects.get(2).unwrap().status, "Pending");
        assert!(guard.projects.filtered_projects().is_empty());
        assert_eq!(notices.drain(), vec![Notice::error(PROJECT_UPDATE_FAILED)]);
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_clobber_each_other() {
        let remote = Arc::new(FakeRemote::new());
        let gate_one = remote.gate_update(1);
        let gate_two = remote.gate_update(2);
        let (coordinator, state, _) = setup(remote.clone());
        state.with(|s| {
            let page = vec![project_with_progress(1, 10), project_with_progress(2, 20)];
            s.project_cache.insert(CacheKey::ProjectsPage(1), page.clone());
            s.projects.set_projects(page);
        });

        let first = ProjectForm::from_project(&project_with_progress(1, 90));
        let second = ProjectForm::from_project(&project_with_progress(2, 70));

        let driver = async {
            while remote.dispatched() < 2 {
                tokio::task::yield_now().await;
            }
            // the second write resolves first and succeeds, then the first fails
            gate_two
                .send(Ok(project_with_progress(2, 70)))
                .unwrap();
            tokio::task::yield_now().await;
            gate_one
                .send(Err(RemoteError::Transport("connection reset".to_string())))
                .unwrap();
        };

        let (one, two, ()) = tokio::join!(
            coordinator.submit_project_update(1, &first),
            coordinator.submit_project_update(1, &second),
            driver
        );

        assert_eq!(one.unwrap().phase, Phase::RolledBack);
        assert_eq!(two.unwrap().phase, Phase::Committed);

        let guard = state.lock();
        let progress: Vec<i32> = guard.projects.projects().iter().map(|p| p.progress).collect();
        assert_eq!(progress, vec![10, 70]);
        let cached: Vec<i32> = guard
            .project_cache
            .get(&CacheKey::ProjectsPage(1))
            .unwrap()
            .iter()
            .map(|p| p.progress)
            .collect();
        assert_eq!(cached, vec![10, 70]);
    }
}
