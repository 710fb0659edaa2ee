use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskflow-{nanos}-{file_name}"))
}

fn write_store(path: &Path, tasks: serde_json::Value, counter: u64) {
    let content = serde_json::json!({
        "taskflow_tasks": tasks.to_string(),
        "taskflow_counter": counter.to_string(),
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn read_store(path: &Path) -> (serde_json::Value, String) {
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    let tasks = serde_json::from_str(stored["taskflow_tasks"].as_str().unwrap()).unwrap();
    let counter = stored["taskflow_counter"].as_str().unwrap().to_string();
    (tasks, counter)
}

fn run(store_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taskflow"))
        .args(args)
        .env("TASKFLOW_STORE_PATH", store_path)
        .env("TASKFLOW_CONFIG_PATH", temp_path("missing-config.json"))
        .output()
        .expect("failed to run taskflow")
}

fn seed(path: &Path) {
    write_store(
        path,
        serde_json::json!([
            {
                "id": 1,
                "text": "Buy milk",
                "completed": false,
                "createdAt": "2025-01-01T08:00:00Z",
                "completedAt": null
            },
            {
                "id": 2,
                "text": "Pay bills",
                "completed": true,
                "createdAt": "2025-01-02T08:00:00Z",
                "completedAt": "2025-01-02T09:00:00Z"
            },
            {
                "id": 3,
                "text": "Buy bread",
                "completed": false,
                "createdAt": "2025-01-03T08:00:00Z",
                "completedAt": null
            }
        ]),
        4,
    );
}

#[test]
fn clear_requires_force() {
    let store_path = temp_path("cli-clear-refused.json");
    seed(&store_path);

    let output = run(&store_path, &["clear"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));

    let (tasks, _) = read_store(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(tasks.as_array().unwrap().len(), 3);
}

#[test]
fn clear_with_force_keeps_counter() {
    let store_path = temp_path("cli-clear.json");
    seed(&store_path);

    let output = run(&store_path, &["clear", "--force"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cleared 3 tasks"));

    let (tasks, counter) = read_store(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert_eq!(tasks.as_array().unwrap().len(), 0);
    assert_eq!(counter, "4");
}

#[test]
fn delete_completed_removes_only_completed() {
    let store_path = temp_path("cli-delete-completed.json");
    seed(&store_path);

    let output = run(&store_path, &["delete-completed"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted 1 completed task"));

    let output = run(&store_path, &["delete-completed", "--json"]);
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["affected"], 0);

    let (tasks, _) = read_store(&store_path);
    std::fs::remove_file(&store_path).ok();

    let ids: Vec<u64> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn complete_all_respects_view_flags() {
    let store_path = temp_path("cli-complete-all.json");
    seed(&store_path);

    let output = run(&store_path, &["complete-all", "--search", "buy"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Marked 2 tasks as completed"));

    let (tasks, _) = read_store(&store_path);

    for task in tasks.as_array().unwrap() {
        assert_eq!(task["completed"], true);
        assert!(task["completedAt"].is_string());
    }
    assert_eq!(tasks[1]["completedAt"], "2025-01-02T09:00:00Z");

    let output = run(&store_path, &["complete-all"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No pending tasks to complete"));
}
