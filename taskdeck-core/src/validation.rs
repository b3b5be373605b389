//! Client-side checks run before any form is submitted.
//!
//! A form that fails validation never reaches the network and never touches
//! local state.

use chrono::NaiveDate;
use shared_types::{LoginRequest, NewTask, Project};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .0
            .iter()
            .map(|error| format!("{}: {}", error.field, error.message))
            .collect();
        write!(f, "Invalid input ({})", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn finish<T>(errors: Vec<FieldError>, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
    if errors.is_empty() {
        Ok(value())
    } else {
        Err(ValidationErrors(errors))
    }
}

/// Edit-project form, prefilled from the project being edited
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectForm {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub progress: Option<i32>,
    pub budget: Option<f64>,
}

impl ProjectForm {
    pub fn from_project(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            status: project.status.clone(),
            start_date: Some(project.start_date),
            end_date: Some(project.end_date),
            progress: Some(project.progress),
            budget: Some(project.budget),
        }
    }

    pub fn validate(&self) -> Result<Project, ValidationErrors> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new("name", "Project name is required"));
        }
        if self.status.trim().is_empty() {
            errors.push(FieldError::new("status", "Status is required"));
        }
        if self.start_date.is_none() {
            errors.push(FieldError::new("startDate", "Start date is required"));
        }
        if self.end_date.is_none() {
            errors.push(FieldError::new("endDate", "End date is required"));
        }
        match self.progress {
            None => errors.push(FieldError::new("progress", "Progress is required")),
            Some(p) if p < 0 => errors.push(FieldError::new("progress", "Progress must be at least 0")),
            Some(p) if p > 100 => {
                errors.push(FieldError::new("progress", "Progress cannot exceed 100"))
            }
            Some(_) => {}
        }
        match self.budget {
            None => errors.push(FieldError::new("budget", "Budget is required")),
            Some(b) if !b.is_finite() || b < 0.0 => {
                errors.push(FieldError::new("budget", "Budget must be positive"))
            }
            Some(_) => {}
        }

        finish(errors, || Project {
            id: self.id,
            name: self.name.clone(),
            status: self.status.clone(),
            start_date: self.start_date.unwrap_or_default(),
            end_date: self.end_date.unwrap_or_default(),
            progress: self.progress.unwrap_or_default(),
            budget: self.budget.unwrap_or_default(),
        })
    }
}

/// Add-task form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<i64>,
}

impl Default for TaskForm {
    fn default() -> Self {
        let defaults = NewTask::for_project(0);
        Self {
            title: defaults.title,
            status: defaults.status,
            priority: defaults.priority,
            assigned_to: Some(defaults.assigned_to),
        }
    }
}

impl TaskForm {
    pub fn validate(&self, project_id: i64) -> Result<NewTask, ValidationErrors> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title is required"));
        }
        if self.status.trim().is_empty() {
            errors.push(FieldError::new("status", "Status is required"));
        }
        if self.priority.trim().is_empty() {
            errors.push(FieldError::new("priority", "Priority is required"));
        }
        if !matches!(self.assigned_to, Some(user) if user > 0) {
            errors.push(FieldError::new("assignedTo", "Assigned user is required"));
        }

        finish(errors, || NewTask {
            project_id,
            title: self.title.clone(),
            status: self.status.clone(),
            priority: self.priority.clone(),
            assigned_to: self.assigned_to.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, ValidationErrors> {
        let mut errors = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !looks_like_email(email) {
            errors.push(FieldError::new("email", "Invalid email address"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }

        finish(errors, || LoginRequest {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}
