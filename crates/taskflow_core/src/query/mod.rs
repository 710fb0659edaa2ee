//! Pure derivation of views and aggregates from a task collection.
//!
//! Nothing in here mutates tasks. Every function takes the evaluation time
//! explicitly; "today" is the calendar date of `now` in `now`'s own offset.

mod filter;
mod sort;
mod stats;

pub use filter::{CategoryFilter, SearchMatcher, StatusFilter, filter_tasks};
pub use sort::{SortMode, sort_tasks};
pub use stats::{CategoryCounts, CategoryStats, DueStats, Statistics, compute_statistics};

use crate::model::Task;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

/// Optional filter axes a deployment turns on. A disabled axis never
/// excludes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub search: bool,
    pub due_dates: bool,
    pub categories: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            search: true,
            due_dates: true,
            categories: true,
        }
    }
}

/// The current view selection: search text, status and category filters,
/// and sort mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub search: String,
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub sort: SortMode,
}

impl TaskQuery {
    pub fn with_sort(sort: SortMode) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    /// True when nothing narrows the view.
    pub fn is_unfiltered(&self) -> bool {
        self.search.trim().is_empty()
            && self.status == StatusFilter::All
            && self.category == CategoryFilter::All
    }
}

/// Filters `tasks` by `query` and orders the result by `query.sort`.
pub fn filtered_sorted<'a>(
    tasks: &'a [Task],
    query: &TaskQuery,
    features: Features,
    now: OffsetDateTime,
) -> Vec<&'a Task> {
    let mut view = filter_tasks(tasks, query, features, now);
    sort_tasks(&mut view, query.sort, features);
    view
}

pub fn now_local() -> OffsetDateTime {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::now_utc().to_offset(offset)
}
