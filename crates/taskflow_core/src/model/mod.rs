mod task;

pub use task::{Category, Task, TaskDraft, parse_due_date};
