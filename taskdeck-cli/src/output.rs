use shared_types::{Project, Task};
use std::fmt::Write;

use taskdeck_core::store::TaskStats;
use taskdeck_core::ProjectStats;

pub fn project_table(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects found\n".to_string();
    }

    let name_width = column_width(projects.iter().map(|p| p.name.as_str()), "NAME");
    let status_width = column_width(projects.iter().map(|p| p.status.as_str()), "STATUS");

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<name_width$}  {:<status_width$}  {:>8}  {:>12}  {:<10}  {:<10}",
        "ID", "NAME", "STATUS", "PROGRESS", "BUDGET", "START", "END"
    );
    for project in projects {
        let _ = writeln!(
            out,
            "{:>5}  {:<name_width$}  {:<status_width$}  {:>7}%  {:>12.2}  {:<10}  {:<10}",
            project.id,
            project.name,
            project.status,
            project.progress,
            project.budget,
            project.start_date,
            project.end_date
        );
    }
    out
}

pub fn page_footer(page: u32, total_pages: Option<u32>, shown: usize, loaded: usize) -> String {
    let pages = match total_pages {
        Some(total) => format!("Page {} of {}", page, total),
        None => format!("Page {}", page),
    };
    if shown == loaded {
        pages
    } else {
        format!("{} ({} of {} projects match the filters)", pages, shown, loaded)
    }
}

pub fn project_detail(project: &Project) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", project.name, project.id);
    let _ = writeln!(out, "  Status:   {}", project.status);
    let _ = writeln!(out, "  Progress: {}%", project.progress);
    let _ = writeln!(out, "  Budget:   {:.2}", project.budget);
    let _ = writeln!(out, "  Dates:    {} to {}", project.start_date, project.end_date);
    out
}

pub fn task_table(tasks: &[Task]) -> String {
    let title_width = column_width(tasks.iter().map(|t| t.title.as_str()), "TITLE");

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<title_width$}  {:<12}  {:<8}  {:>8}",
        "ID", "TITLE", "STATUS", "PRIORITY", "ASSIGNEE"
    );
    for task in tasks {
        let _ = writeln!(
            out,
            "{:>5}  {:<title_width$}  {:<12}  {:<8}  {:>8}",
            task.id, task.title, task.status, task.priority, task.assigned_to
        );
    }
    out
}

pub fn task_stats_line(stats: &TaskStats) -> String {
    format!(
        "{} tasks: {} completed, {} in progress, {} high priority",
        stats.total, stats.completed, stats.in_progress, stats.high_priority
    )
}

pub fn stats_summary(stats: &ProjectStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Projects:         {}", stats.total);
    let _ = writeln!(out, "  Active:         {}", stats.active);
    let _ = writeln!(out, "  In Progress:    {}", stats.in_progress);
    let _ = writeln!(out, "  Completed:      {}", stats.completed);
    let _ = writeln!(out, "  Pending:        {}", stats.pending);
    let _ = writeln!(out, "  Not Started:    {}", stats.not_started);
    if stats.other > 0 {
        let _ = writeln!(out, "  Other:          {}", stats.other);
    }
    let _ = writeln!(out, "Completion rate:  {:.1}%", stats.completion_rate());
    let _ = writeln!(out, "Average progress: {:.1}%", stats.average_progress);
    let _ = writeln!(out, "Total budget:     {:.2}", stats.total_budget);
    out
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0)
}
