use super::filter::{filter_tasks, is_recent};
use super::{Features, TaskQuery};
use crate::model::{Category, Task};
use serde::Serialize;
use std::collections::BTreeMap;
use time::{Date, OffsetDateTime};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Size of the current filtered view.
    pub filtered: usize,
    pub created_today: usize,
    pub completed_today: usize,
    pub recent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DueStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DueStats {
    pub overdue: usize,
    pub due_today: usize,
    pub upcoming: usize,
    pub no_due_date: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Number of distinct categories present.
    pub in_use: usize,
    pub breakdown: BTreeMap<Category, CategoryCounts>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

pub fn compute_statistics(
    tasks: &[Task],
    query: &TaskQuery,
    features: Features,
    now: OffsetDateTime,
) -> Statistics {
    let today = now.date();
    let completed = tasks.iter().filter(|task| task.completed).count();

    Statistics {
        total: tasks.len(),
        completed,
        pending: tasks.len() - completed,
        filtered: filter_tasks(tasks, query, features, now).len(),
        created_today: tasks
            .iter()
            .filter(|task| local_date(task.created_at, now) == today)
            .count(),
        completed_today: tasks
            .iter()
            .filter(|task| task.completed_at.is_some_and(|at| local_date(at, now) == today))
            .count(),
        recent: tasks.iter().filter(|task| is_recent(task, now)).count(),
        due: features.due_dates.then(|| due_stats(tasks, today)),
        categories: features.categories.then(|| category_stats(tasks)),
    }
}

fn local_date(at: OffsetDateTime, now: OffsetDateTime) -> Date {
    at.to_offset(now.offset()).date()
}

fn due_stats(tasks: &[Task], today: Date) -> DueStats {
    let mut stats = DueStats::default();
    for task in tasks {
        match task.due_date {
            None => stats.no_due_date += 1,
            Some(due) if due == today => stats.due_today += 1,
            Some(due) if due > today && !task.completed => stats.upcoming += 1,
            Some(_) => {}
        }
        if task.is_overdue(today) {
            stats.overdue += 1;
        }
    }
    stats
}

fn category_stats(tasks: &[Task]) -> CategoryStats {
    let mut breakdown: BTreeMap<Category, CategoryCounts> = BTreeMap::new();
    for task in tasks {
        let counts = breakdown.entry(task.category).or_default();
        counts.total += 1;
        if task.completed {
            counts.completed += 1;
        } else {
            counts.pending += 1;
        }
    }

    CategoryStats {
        in_use: breakdown.len(),
        breakdown,
    }
}
