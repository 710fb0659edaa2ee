use super::Features;
use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    #[default]
    CreatedDesc,
    CreatedAsc,
    Alphabetical,
    /// Pending first, newest first within each group.
    Completion,
    /// Pending first, then dated tasks by due date, then undated ones.
    DueDate,
}

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        Self::CreatedDesc,
        Self::CreatedAsc,
        Self::Alphabetical,
        Self::Completion,
        Self::DueDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedDesc => "created-desc",
            Self::CreatedAsc => "created-asc",
            Self::Alphabetical => "alphabetical",
            Self::Completion => "completion",
            Self::DueDate => "due-date",
        }
    }

    pub fn compare(self, a: &Task, b: &Task, features: Features) -> Ordering {
        match self {
            Self::CreatedDesc => newest_first(a, b),
            Self::CreatedAsc => a.created_at.cmp(&b.created_at),
            Self::Alphabetical => alphabetical(a, b),
            Self::DueDate if !features.due_dates => Self::Completion.compare(a, b, features),
            Self::Completion => a.completed.cmp(&b.completed).then_with(|| newest_first(a, b)),
            Self::DueDate => a
                .completed
                .cmp(&b.completed)
                .then_with(|| by_due_date(a, b))
                .then_with(|| newest_first(a, b)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == wanted)
            .ok_or_else(|| AppError::invalid_input(format!("unknown sort mode '{}'", raw.trim())))
    }
}

fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn alphabetical(a: &Task, b: &Task) -> Ordering {
    a.text
        .to_lowercase()
        .cmp(&b.text.to_lowercase())
        .then_with(|| a.text.cmp(&b.text))
}

fn by_due_date(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort: ties keep their input order.
pub fn sort_tasks(tasks: &mut [&Task], mode: SortMode, features: Features) {
    tasks.sort_by(|a, b| mode.compare(a, b, features));
}
