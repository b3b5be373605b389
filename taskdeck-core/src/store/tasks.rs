use shared_types::{Task, TaskPriority, TaskStatus};

use super::filter::ALL_STATUSES;

/// Tasks belonging to `project_id`, in server order.
pub fn tasks_for_project(tasks: &[Task], project_id: i64) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| task.project_id == project_id)
        .cloned()
        .collect()
}

/// Filters on the project detail task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub search: String,
    pub status: String,
    pub priority: String,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: ALL_STATUSES.to_string(),
            priority: ALL_STATUSES.to_string(),
        }
    }
}

impl TaskFilter {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || self.status != ALL_STATUSES || self.priority != ALL_STATUSES
    }

    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let query = self.search.to_lowercase();
        let status = self.status.to_lowercase();
        let priority = self.priority.to_lowercase();

        tasks
            .iter()
            .filter(|task| query.is_empty() || task.title.to_lowercase().contains(&query))
            .filter(|task| self.status == ALL_STATUSES || task.status.to_lowercase() == status)
            .filter(|task| {
                self.priority == ALL_STATUSES || task.priority.to_lowercase() == priority
            })
            .cloned()
            .collect()
    }
}

/// Counters shown above a project's task list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub high_priority: usize,
}

impl TaskStats {
    /// `None` when the project has no tasks at all.
    pub fn from_tasks(tasks: &[Task]) -> Option<Self> {
        if tasks.is_empty() {
            return None;
        }

        let completed_label = TaskStatus::Completed.label().to_lowercase();
        let in_progress_label = TaskStatus::InProgress.label().to_lowercase();
        let high_label = TaskPriority::High.label().to_lowercase();

        Some(tasks.iter().fold(
            TaskStats {
                total: tasks.len(),
                ..Default::default()
            },
            |mut stats, task| {
                let status = task.status.to_lowercase();
                if status == completed_label {
                    stats.completed += 1;
                }
                // "active" is the project vocabulary but shows up on tasks too
                if status == in_progress_label || status == "active" {
                    stats.in_progress += 1;
                }
                if task.priority.to_lowercase() == high_label {
                    stats.high_priority += 1;
                }
                stats
            },
        ))
    }
}
