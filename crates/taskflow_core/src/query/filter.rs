use super::{Features, TaskQuery};
use crate::error::AppError;
use crate::model::{Category, Task};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::{Duration, OffsetDateTime};

/// Status and recency axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
    /// Created within the trailing 24 hours.
    Recent,
    DueToday,
    Overdue,
    NoDueDate,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 7] = [
        Self::All,
        Self::Completed,
        Self::Pending,
        Self::Recent,
        Self::DueToday,
        Self::Overdue,
        Self::NoDueDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Pending => "pending",
            Self::Recent => "recent",
            Self::DueToday => "due-today",
            Self::Overdue => "overdue",
            Self::NoDueDate => "no-due-date",
        }
    }

    pub fn matches(self, task: &Task, features: Features, now: OffsetDateTime) -> bool {
        let today = now.date();
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
            Self::Recent => is_recent(task, now),
            Self::DueToday | Self::Overdue | Self::NoDueDate if !features.due_dates => true,
            Self::DueToday => task.due_date == Some(today),
            Self::Overdue => task.is_overdue(today),
            Self::NoDueDate => task.due_date.is_none(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == wanted)
            .ok_or_else(|| AppError::invalid_input(format!("unknown filter '{}'", raw.trim())))
    }
}

/// Category axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, task: &Task, features: Features) -> bool {
        match self {
            Self::All => true,
            Self::Only(_) if !features.categories => true,
            Self::Only(category) => task.category == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => category.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        raw.parse().map(Self::Only)
    }
}

/// Case-insensitive substring matcher over task text.
#[derive(Debug, Clone)]
pub struct SearchMatcher {
    needle: String,
}

impl SearchMatcher {
    /// Returns `None` for blank queries, which match everything.
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: trimmed.to_lowercase(),
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.text.to_lowercase().contains(&self.needle)
    }
}

pub(crate) fn is_recent(task: &Task, now: OffsetDateTime) -> bool {
    now - task.created_at < Duration::DAY
}

/// Keeps the tasks that pass every enabled axis, in input order.
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    query: &TaskQuery,
    features: Features,
    now: OffsetDateTime,
) -> Vec<&'a Task> {
    let matcher = features
        .search
        .then(|| SearchMatcher::new(&query.search))
        .flatten();

    tasks
        .iter()
        .filter(|task| matcher.as_ref().is_none_or(|matcher| matcher.matches(task)))
        .filter(|task| query.status.matches(task, features, now))
        .filter(|task| query.category.matches(task, features))
        .collect()
}
