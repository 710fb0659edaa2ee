use crate::error::AppError;
use crate::model::{Task, TaskDraft};
use crate::notify::{NoopNotifier, Notice, Notifier};
use crate::query::{
    self, CategoryFilter, Features, SortMode, Statistics, StatusFilter, TaskQuery,
};
use crate::storage::KeyValueStore;
use crate::storage::json_store;
use std::collections::HashSet;
use time::OffsetDateTime;
use tracing::{debug, error};

/// Owns the task collection, the id counter and the current view selection.
///
/// Every successful mutation writes the whole collection back to storage.
/// A failed write is logged and reported through the [`Notifier`]; the
/// in-memory change stands.
pub struct TaskStore<S> {
    storage: S,
    notifier: Box<dyn Notifier>,
    tasks: Vec<Task>,
    next_id: u64,
    features: Features,
    default_sort: SortMode,
    query: TaskQuery,
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn open(storage: S, features: Features) -> Self {
        let state = json_store::load(&storage);
        debug!(
            tasks = state.tasks.len(),
            next_id = state.next_id,
            "opened task store"
        );

        Self {
            storage,
            notifier: Box::new(NoopNotifier),
            tasks: state.tasks,
            next_id: state.next_id,
            features,
            default_sort: SortMode::default(),
            query: TaskQuery::default(),
        }
    }

    pub fn with_notifier<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Sort mode used initially and restored by [`Self::clear_filters`].
    pub fn with_default_sort(mut self, sort: SortMode) -> Self {
        self.default_sort = sort;
        self.query.sort = sort;
        self
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn features(&self) -> Features {
        self.features
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn create(&mut self, text: &str, draft: TaskDraft) -> Result<Task, AppError> {
        let text = validated_text(text)?;
        let following = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| AppError::persistence("task id counter is exhausted"))?;

        let task = Task {
            id: self.next_id,
            text,
            completed: false,
            created_at: OffsetDateTime::now_utc(),
            completed_at: None,
            due_date: draft.due_date,
            category: draft.category.unwrap_or_default(),
        };
        self.next_id = following;
        self.tasks.push(task.clone());
        debug!(id = task.id, "created task");

        self.persist();
        Ok(task)
    }

    pub fn delete(&mut self, id: u64) -> Result<Task, AppError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(AppError::NotFound(id))?;

        let removed = self.tasks.remove(index);
        debug!(id, "deleted task");

        self.persist();
        Ok(removed)
    }

    pub fn toggle(&mut self, id: u64) -> Result<Task, AppError> {
        let now = OffsetDateTime::now_utc();
        let task = self.find_mut(id)?;
        let completed = !task.completed;
        task.set_completed(completed, now);
        let updated = task.clone();
        debug!(id, completed, "toggled task");

        self.persist();
        Ok(updated)
    }

    pub fn edit(&mut self, id: u64, new_text: &str) -> Result<Task, AppError> {
        let text = validated_text(new_text)?;
        let task = self.find_mut(id)?;
        task.text = text;
        let updated = task.clone();
        debug!(id, "edited task");

        self.persist();
        Ok(updated)
    }

    /// Removes every task. The counter keeps running.
    pub fn clear(&mut self) -> usize {
        let removed = self.tasks.len();
        self.tasks.clear();
        debug!(removed, "cleared tasks");

        self.persist();
        removed
    }

    pub fn delete_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed);
        let removed = before - self.tasks.len();
        if removed == 0 {
            return 0;
        }
        debug!(removed, "deleted completed tasks");

        self.persist();
        removed
    }

    /// Completes the pending tasks among `ids`. Unknown ids are skipped.
    pub fn mark_all_completed(&mut self, ids: &[u64]) -> usize {
        let wanted: HashSet<u64> = ids.iter().copied().collect();
        let now = OffsetDateTime::now_utc();
        let mut affected = 0;

        for task in &mut self.tasks {
            if !task.completed && wanted.contains(&task.id) {
                task.set_completed(true, now);
                affected += 1;
            }
        }
        if affected == 0 {
            return 0;
        }
        debug!(affected, "marked tasks completed");

        self.persist();
        affected
    }

    /// [`Self::mark_all_completed`] over the current filtered view.
    pub fn mark_all_visible_completed(&mut self, now: OffsetDateTime) -> usize {
        let ids: Vec<u64> = self.visible_tasks(now).iter().map(|task| task.id).collect();
        self.mark_all_completed(&ids)
    }

    pub fn query(&self) -> &TaskQuery {
        &self.query
    }

    pub fn set_search(&mut self, text: &str) {
        self.query.search = text.trim().to_string();
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.query.status = status;
    }

    pub fn set_category_filter(&mut self, category: CategoryFilter) {
        self.query.category = category;
    }

    pub fn set_sort(&mut self, sort: SortMode) {
        self.query.sort = sort;
    }

    pub fn clear_filters(&mut self) {
        self.query = TaskQuery::with_sort(self.default_sort);
    }

    /// The filtered, sorted view for the current selection.
    pub fn visible_tasks(&self, now: OffsetDateTime) -> Vec<&Task> {
        query::filtered_sorted(&self.tasks, &self.query, self.features, now)
    }

    pub fn statistics(&self, now: OffsetDateTime) -> Statistics {
        query::compute_statistics(&self.tasks, &self.query, self.features, now)
    }

    pub fn export(&self) -> Result<String, AppError> {
        json_store::export(&self.tasks)
    }

    fn find_mut(&mut self, id: u64) -> Result<&mut Task, AppError> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(AppError::NotFound(id))
    }

    fn persist(&mut self) {
        if let Err(err) = json_store::save(&mut self.storage, &self.tasks, self.next_id) {
            error!(error = %err, "failed to save tasks");
            self.notifier.notify(&Notice::error(format!(
                "failed to save tasks, changes may be lost: {err}"
            )));
        }
    }
}

fn validated_text(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::EmptyText);
    }
    Ok(trimmed.to_string())
}
