//! Plain-text rendering of task views and statistics.

use tabled::settings::Style;
use tabled::{Table, Tabled};
use taskflow_core::error::AppError;
use taskflow_core::model::Task;
use taskflow_core::query::{Features, Statistics};
use time::OffsetDateTime;
use time::macros::format_description;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Task")]
    text: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Due")]
    due: String,
    #[tabled(rename = "Created")]
    created: String,
}

pub fn status_label(task: &Task, features: Features, now: OffsetDateTime) -> String {
    if task.completed {
        "completed".to_string()
    } else if features.due_dates && task.is_overdue(now.date()) {
        "pending (overdue)".to_string()
    } else {
        "pending".to_string()
    }
}

/// Table of `tasks` with timestamps shown in the offset of `now`.
pub fn task_table(
    tasks: &[&Task],
    features: Features,
    now: OffsetDateTime,
) -> Result<String, AppError> {
    let created_format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    let mut rows = Vec::with_capacity(tasks.len());

    for task in tasks {
        let created = task
            .created_at
            .to_offset(now.offset())
            .format(created_format)
            .map_err(|err| AppError::invalid_input(err.to_string()))?;
        rows.push(TaskRow {
            id: task.id,
            status: status_label(task, features, now),
            text: task.text.clone(),
            category: if features.categories {
                task.category.to_string()
            } else {
                "-".to_string()
            },
            due: match task.due_date {
                Some(due) if features.due_dates => due.to_string(),
                _ => "-".to_string(),
            },
            created,
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::psql());
    Ok(table.to_string())
}

/// "Showing X of Y" line, or `None` when the view is not narrowed.
pub fn view_summary(shown: usize, total: usize, narrowed: bool) -> Option<String> {
    narrowed.then(|| format!("Showing {shown} of {total}"))
}

pub fn statistics_text(stats: &Statistics) -> String {
    let mut lines = vec![
        format!("Total: {}", stats.total),
        format!("Completed: {}", stats.completed),
        format!("Pending: {}", stats.pending),
        format!("Showing: {}", stats.filtered),
        format!("Created today: {}", stats.created_today),
        format!("Completed today: {}", stats.completed_today),
        format!("Recent (24h): {}", stats.recent),
    ];

    if let Some(due) = &stats.due {
        lines.push(format!("Overdue: {}", due.overdue));
        lines.push(format!("Due today: {}", due.due_today));
        lines.push(format!("Upcoming: {}", due.upcoming));
        lines.push(format!("No due date: {}", due.no_due_date));
    }

    if let Some(categories) = &stats.categories {
        lines.push(format!("Categories in use: {}", categories.in_use));
        for (category, counts) in &categories.breakdown {
            lines.push(format!(
                "  {category}: {} total, {} completed, {} pending",
                counts.total, counts.completed, counts.pending
            ));
        }
    }

    lines.join("\n")
}

/// "1 task", "3 completed tasks".
pub fn count_label(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
