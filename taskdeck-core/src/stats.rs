use serde::Serialize;
use shared_types::{Project, ProjectStatus};

/// Dashboard summary computed over the full project collection
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProjectStats {
    pub total: usize,
    pub active: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub pending: usize,
    pub not_started: usize,
    /// Projects whose status is outside the known vocabulary
    pub other: usize,
    pub average_progress: f64,
    pub total_budget: f64,
}

impl ProjectStats {
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut stats = projects.iter().fold(
            ProjectStats {
                total: projects.len(),
                ..Default::default()
            },
            |mut stats, project| {
                match project.known_status() {
                    Some(ProjectStatus::Active) => stats.active += 1,
                    Some(ProjectStatus::InProgress) => stats.in_progress += 1,
                    Some(ProjectStatus::Completed) => stats.completed += 1,
                    Some(ProjectStatus::Pending) => stats.pending += 1,
                    Some(ProjectStatus::NotStarted) => stats.not_started += 1,
                    None => stats.other += 1,
                }
                stats.average_progress += f64::from(project.progress);
                stats.total_budget += project.budget;
                stats
            },
        );

        if stats.total > 0 {
            stats.average_progress /= stats.total as f64;
        }
        stats
    }

    /// Projects still being worked on (`Active` or `In Progress`).
    pub fn ongoing(&self) -> usize {
        self.active + self.in_progress
    }

    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.total as f64
        }
    }
}
