use anyhow::{Context, Result};
use shared_types::Project;

use taskdeck_core::store::{TaskFilter, TaskStats};
use taskdeck_core::{Dashboard, LoginForm, PageOutcome, ProjectForm, TaskForm};

use crate::output;
use crate::Command;

pub async fn run(dashboard: &mut Dashboard, command: Command) -> Result<()> {
    if !matches!(command, Command::Login { .. }) {
        dashboard.require_session()?;
    }

    match command {
        Command::Login { email, password } => {
            let user = dashboard.sign_in(&LoginForm { email, password }).await?;
            println!("Logged in as {} <{}>", user.name, user.email);
            Ok(())
        }
        Command::Logout => {
            dashboard.sign_out()?;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = dashboard.require_session()?;
            println!("{} <{}> ({:?})", user.name, user.email, user.role);
            Ok(())
        }
        Command::Projects {
            page,
            search,
            status,
        } => list_projects(dashboard, page, search, status).await,
        Command::Stats { json } => {
            let stats = dashboard.fetcher().load_stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", output::stats_summary(&stats));
            }
            Ok(())
        }
        Command::Project {
            id,
            search,
            status,
            priority,
        } => {
            let defaults = TaskFilter::default();
            let filter = TaskFilter {
                search: search.unwrap_or(defaults.search),
                status: status.unwrap_or(defaults.status),
                priority: priority.unwrap_or(defaults.priority),
            };
            show_project(dashboard, id, &filter).await
        }
        Command::EditProject {
            id,
            page,
            name,
            status,
            start_date,
            end_date,
            progress,
            budget,
        } => {
            let project = current_project(dashboard, page, id).await?;
            let mut form = ProjectForm::from_project(&project);
            if let Some(name) = name {
                form.name = name;
            }
            if let Some(status) = status {
                form.status = status;
            }
            form.start_date = start_date.or(form.start_date);
            form.end_date = end_date.or(form.end_date);
            form.progress = progress.or(form.progress);
            form.budget = budget.or(form.budget);

            let outcome = dashboard
                .coordinator()
                .submit_project_update(page, &form)
                .await?;
            let saved = outcome.into_result()?;
            println!("Saved project {}", saved.id);
            print!("{}", output::project_table(&[saved]));
            Ok(())
        }
        Command::AddTask {
            project_id,
            title,
            status,
            priority,
            assigned_to,
        } => {
            // the optimistic entry is appended to the cached task list
            dashboard
                .fetcher()
                .load_project_tasks(project_id)
                .await
                .with_context(|| format!("Failed to load tasks of project {}", project_id))?;

            let defaults = TaskForm::default();
            let form = TaskForm {
                title,
                status: status.unwrap_or(defaults.status),
                priority: priority.unwrap_or(defaults.priority),
                assigned_to: assigned_to.or(defaults.assigned_to),
            };
            let outcome = dashboard
                .coordinator()
                .submit_task_create(project_id, &form)
                .await?;
            let task = outcome.into_result()?;
            println!("Added task {} to project {}", task.id, project_id);
            Ok(())
        }
    }
}

async fn list_projects(
    dashboard: &Dashboard,
    page: u32,
    search: Option<String>,
    status: Option<String>,
) -> Result<()> {
    dashboard.state().with(|state| {
        if let Some(search) = search {
            state.projects.set_search(search);
        }
        if let Some(status) = status {
            state.projects.set_status_filter(status);
        }
    });

    if let PageOutcome::Applied { total_pages, .. } = dashboard.fetcher().load_page(page).await? {
        let state = dashboard.state().lock();
        print!("{}", output::project_table(state.projects.filtered_projects()));
        println!(
            "{}",
            output::page_footer(
                page,
                total_pages,
                state.projects.filtered_projects().len(),
                state.projects.projects().len()
            )
        );
    }
    Ok(())
}

async fn show_project(dashboard: &Dashboard, id: i64, filter: &TaskFilter) -> Result<()> {
    let project = dashboard.fetcher().load_project(id).await?;
    let tasks = dashboard.fetcher().load_project_tasks(id).await?;

    print!("{}", output::project_detail(&project));
    if let Some(stats) = TaskStats::from_tasks(&tasks) {
        println!("{}", output::task_stats_line(&stats));
    }

    let visible = filter.apply(&tasks);
    if visible.is_empty() {
        if filter.is_active() {
            println!("No tasks match the current filters");
        } else {
            println!("No tasks yet");
        }
    } else {
        print!("{}", output::task_table(&visible));
    }
    Ok(())
}

/// The project as shown on listing page `page`, fetched directly when the
/// page does not contain it.
async fn current_project(dashboard: &Dashboard, page: u32, id: i64) -> Result<Project> {
    dashboard.fetcher().load_page(page).await?;
    let listed = dashboard.state().lock().projects.get(id).cloned();
    match listed {
        Some(project) => Ok(project),
        None => Ok(dashboard.fetcher().load_project(id).await?),
    }
}
