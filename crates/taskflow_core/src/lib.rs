pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod query;
pub mod storage;
pub mod task_api;

pub use task_api::TaskStore;
