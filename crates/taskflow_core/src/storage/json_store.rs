use super::KeyValueStore;
use crate::error::AppError;
use crate::model::Task;
use std::collections::HashSet;
use tracing::warn;

pub const TASKS_KEY: &str = "taskflow_tasks";
pub const COUNTER_KEY: &str = "taskflow_counter";

const FIRST_ID: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub tasks: Vec<Task>,
    pub next_id: u64,
}

impl Default for TaskState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: FIRST_ID,
        }
    }
}

pub fn save<S: KeyValueStore + ?Sized>(
    store: &mut S,
    tasks: &[Task],
    next_id: u64,
) -> Result<(), AppError> {
    let payload = serde_json::to_string(tasks)?;
    store.set(TASKS_KEY, &payload)?;
    store.set(COUNTER_KEY, &next_id.to_string())
}

/// Restores the collection and counter. Never fails: missing, unreadable or
/// corrupt entries fall back to an empty collection and a counter of 1.
pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> TaskState {
    let tasks = load_tasks(store);
    let counter = load_counter(store);
    repair(tasks, counter)
}

/// Pretty-printed backup document with the same layout as the stored list.
pub fn export(tasks: &[Task]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

fn load_tasks<S: KeyValueStore + ?Sized>(store: &S) -> Vec<Task> {
    let raw = match store.get(TASKS_KEY) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, "failed to read stored tasks, starting empty");
            return Vec::new();
        }
    };

    let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, key = TASKS_KEY, "stored tasks are corrupt, starting empty");
            return Vec::new();
        }
    };

    // A malformed record is skipped on its own so the rest of the list survives.
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(task) => Some(task),
            Err(err) => {
                warn!(error = %err, key = TASKS_KEY, index, "skipping malformed stored task");
                None
            }
        })
        .collect()
}

fn load_counter<S: KeyValueStore + ?Sized>(store: &S) -> u64 {
    let raw = match store.get(COUNTER_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return FIRST_ID,
        Err(err) => {
            warn!(error = %err, "failed to read task counter, restarting at {FIRST_ID}");
            return FIRST_ID;
        }
    };

    match parse_counter(&raw) {
        Some(u64::MAX) => {
            warn!(value = %raw, "stored task counter is exhausted, restarting at {FIRST_ID}");
            FIRST_ID
        }
        Some(counter) => counter,
        None => {
            warn!(value = %raw, "stored task counter is not a number, restarting at {FIRST_ID}");
            FIRST_ID
        }
    }
}

// Leading digits only, so "12px" reads as 12.
fn parse_counter(raw: &str) -> Option<u64> {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn repair(tasks: Vec<Task>, counter: u64) -> TaskState {
    let mut seen = HashSet::new();
    let mut tasks: Vec<Task> = tasks
        .into_iter()
        .filter(|task| {
            if task.id == u64::MAX {
                warn!(id = task.id, "dropping stored task with exhausted id");
                return false;
            }
            if task.text.trim().is_empty() {
                warn!(id = task.id, "dropping stored task with blank text");
                return false;
            }
            if !seen.insert(task.id) {
                warn!(id = task.id, "dropping stored task with duplicate id");
                return false;
            }
            true
        })
        .collect();

    for task in &mut tasks {
        if !task.completed {
            task.completed_at = None;
        } else if task.completed_at.is_none() {
            task.completed_at = Some(task.created_at);
        }
    }

    let floor = tasks
        .iter()
        .map(|task| task.id + 1)
        .max()
        .unwrap_or(FIRST_ID);
    let next_id = counter.max(floor).max(FIRST_ID);
    if next_id != counter {
        warn!(stored = counter, next_id, "task counter behind stored ids, advancing");
    }

    TaskState { tasks, next_id }
}

#[cfg(test)]
mod tests {
    use super::{COUNTER_KEY, TASKS_KEY, TaskState, export, load, parse_counter, save};
    use crate::error::AppError;
    use crate::model::{Category, Task};
    use crate::storage::{KeyValueStore, MemoryStore};
    use time::macros::{date, datetime};

    fn task(id: u64, text: &str) -> Task {
        Task {
            id,
            text: text.to_string(),
            completed: false,
            created_at: datetime!(2025-01-10 12:00:00.250 UTC),
            completed_at: None,
            due_date: None,
            category: Category::Personal,
        }
    }

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, AppError> {
            Err(AppError::persistence("storage unavailable"))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), AppError> {
            Err(AppError::persistence("quota exceeded"))
        }

        fn remove(&mut self, _key: &str) -> Result<(), AppError> {
            Err(AppError::persistence("storage unavailable"))
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut done = task(2, "Pay bills");
        done.set_completed(true, datetime!(2025-01-11 08:00:00 UTC));
        done.due_date = Some(date!(2025 - 01 - 15));
        done.category = Category::Work;
        let tasks = vec![task(1, "Buy milk"), done];

        let mut store = MemoryStore::new();
        save(&mut store, &tasks, 3).unwrap();
        let loaded = load(&store);

        assert_eq!(
            loaded,
            TaskState {
                tasks,
                next_id: 3
            }
        );
    }

    #[test]
    fn save_writes_both_keys() {
        let mut store = MemoryStore::new();
        save(&mut store, &[task(1, "Buy milk")], 2).unwrap();

        assert_eq!(store.get(COUNTER_KEY).unwrap().as_deref(), Some("2"));
        let raw = store.get(TASKS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["text"], "Buy milk");
        let created_at = value[0]["createdAt"].as_str().unwrap();
        assert!(created_at.starts_with("2025-01-10T12:00:00."));
    }

    #[test]
    fn missing_entries_load_as_empty_state() {
        let store = MemoryStore::new();
        assert_eq!(load(&store), TaskState::default());
        assert_eq!(load(&store).next_id, 1);
    }

    #[test]
    fn corrupt_tasks_load_as_empty() {
        let mut store = MemoryStore::new();
        store.set(TASKS_KEY, "[{\"id\": 1, \"text\":").unwrap();

        let state = load(&store);

        assert!(state.tasks.is_empty());
        assert_eq!(state.next_id, 1);
    }

    #[test]
    fn unreadable_store_loads_as_empty() {
        assert_eq!(load(&FailingStore), TaskState::default());
    }

    #[test]
    fn save_reports_storage_failure() {
        let err = save(&mut FailingStore, &[task(1, "Buy milk")], 2).unwrap_err();
        assert_eq!(err.code(), "persistence_error");
    }

    #[test]
    fn counter_parses_leading_digits() {
        assert_eq!(parse_counter("12"), Some(12));
        assert_eq!(parse_counter(" 12px"), Some(12));
        assert_eq!(parse_counter("abc"), None);
        assert_eq!(parse_counter(""), None);
    }

    #[test]
    fn garbage_counter_restarts_at_one_when_no_tasks() {
        let mut store = MemoryStore::new();
        store.set(COUNTER_KEY, "NaN").unwrap();

        assert_eq!(load(&store).next_id, 1);
    }

    #[test]
    fn counter_is_raised_past_stored_ids() {
        let mut store = MemoryStore::new();
        save(&mut store, &[task(4, "a"), task(9, "b")], 2).unwrap();

        assert_eq!(load(&store).next_id, 10);
    }

    #[test]
    fn exhausted_ids_and_counters_are_discarded() {
        let mut store = MemoryStore::new();
        store
            .set(
                TASKS_KEY,
                r#"[
                    {"id":18446744073709551615,"text":"a","createdAt":"2024-05-01T09:00:00Z"},
                    {"id":3,"text":"b","createdAt":"2024-05-01T09:00:00Z"}
                ]"#,
            )
            .unwrap();
        store.set(COUNTER_KEY, "1").unwrap();

        let state = load(&store);

        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].id, 3);
        assert_eq!(state.next_id, 4);

        let mut store = MemoryStore::new();
        store.set(COUNTER_KEY, "18446744073709551615").unwrap();

        assert_eq!(load(&store).next_id, 1);
    }

    #[test]
    fn blank_and_duplicate_records_are_dropped() {
        let mut store = MemoryStore::new();
        store
            .set(
                TASKS_KEY,
                r#"[
                    {"id":1,"text":"first","createdAt":"2024-05-01T09:00:00Z"},
                    {"id":2,"text":"   ","createdAt":"2024-05-01T09:00:00Z"},
                    {"id":1,"text":"second","createdAt":"2024-05-01T09:00:00Z"},
                    {"id":3,"text":"third","createdAt":"2024-05-01T09:00:00Z"}
                ]"#,
            )
            .unwrap();

        let state = load(&store);

        let kept: Vec<(u64, &str)> = state
            .tasks
            .iter()
            .map(|task| (task.id, task.text.as_str()))
            .collect();
        assert_eq!(kept, vec![(1, "first"), (3, "third")]);
        assert_eq!(state.next_id, 4);
    }

    #[test]
    fn malformed_record_does_not_discard_the_rest() {
        let mut store = MemoryStore::new();
        store
            .set(
                TASKS_KEY,
                r#"[
                    {"id":1,"text":"keep","createdAt":"2024-05-01T09:00:00Z"},
                    {"id":2,"text":"bad category","createdAt":"2024-05-01T09:00:00Z","category":"errands"},
                    {"id":3,"text":"bad due","createdAt":"2024-05-01T09:00:00Z","dueDate":""},
                    {"id":4,"text":"also keep","createdAt":"2024-05-01T09:00:00Z"}
                ]"#,
            )
            .unwrap();
        store.set(COUNTER_KEY, "5").unwrap();

        let state = load(&store);

        let ids: Vec<u64> = state.tasks.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(state.next_id, 5);
    }

    #[test]
    fn legacy_records_get_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(
                TASKS_KEY,
                r#"[{"id":1,"text":"Buy milk","completed":false,"createdAt":"2024-05-01T09:00:00.000Z","completedAt":null}]"#,
            )
            .unwrap();
        store.set(COUNTER_KEY, "2").unwrap();

        let state = load(&store);

        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.tasks[0].category, Category::Personal);
        assert_eq!(state.tasks[0].due_date, None);
        assert_eq!(state.next_id, 2);
    }

    #[test]
    fn completion_timestamp_is_repaired_on_load() {
        let mut store = MemoryStore::new();
        store
            .set(
                TASKS_KEY,
                r#"[
                    {"id":1,"text":"a","completed":true,"createdAt":"2024-05-01T09:00:00Z"},
                    {"id":2,"text":"b","completed":false,"createdAt":"2024-05-01T09:00:00Z","completedAt":"2024-05-02T09:00:00Z"}
                ]"#,
            )
            .unwrap();

        let state = load(&store);

        assert_eq!(state.tasks[0].completed_at, Some(state.tasks[0].created_at));
        assert_eq!(state.tasks[1].completed_at, None);
        assert_eq!(state.next_id, 3);
    }

    #[test]
    fn export_is_pretty_printed_task_array() {
        let document = export(&[task(1, "Buy milk")]).unwrap();

        assert!(document.starts_with("[\n"));
        let value: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["category"], "personal");
    }
}
