use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

time::serde::format_description!(due_date_format, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default, with = "due_date_format::option")]
    pub due_date: Option<Date>,
    #[serde(default)]
    pub category: Category,
}

impl Task {
    /// Sets `completed` and keeps `completed_at` in step with it.
    pub fn set_completed(&mut self, completed: bool, now: OffsetDateTime) {
        self.completed = completed;
        self.completed_at = completed.then_some(now);
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < today)
    }
}

/// Extension fields supplied on create. Absent values fall back to the
/// defaults: no due date and [`Category::Personal`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub due_date: Option<Date>,
    pub category: Option<Category>,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Personal,
        Self::Work,
        Self::Shopping,
        Self::Health,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Work => "work",
            Self::Shopping => "shopping",
            Self::Health => "health",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| AppError::invalid_input(format!("unknown category '{}'", raw.trim())))
    }
}

pub fn parse_due_date(raw: &str) -> Result<Date, AppError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| AppError::invalid_input("due date must be YYYY-MM-DD"))
}
