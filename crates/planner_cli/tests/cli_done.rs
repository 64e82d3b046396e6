use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const HEADER: &str = "Task,Priority,Due Date,Note,Status,Created,Completed_TS,Id";

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("planner-{nanos}-{file_name}"))
}

fn write_store(path: &Path, rows: &[&str]) {
    let mut content = format!("{HEADER}\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(path, content).unwrap();
}

fn run(store_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_planner"))
        .args(["--config-override", "backup.enabled=false"])
        .args(args)
        .env("PLANNER_STORE_PATH", store_path)
        .env("PLANNER_CONFIG_PATH", temp_path("absent-config.json"))
        .output()
        .expect("failed to run planner")
}

fn rows(path: &Path) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

#[test]
fn done_command_marks_completed_with_timestamp() {
    let store_path = temp_path("cli-done.csv");
    write_store(
        &store_path,
        &["Water plants,Low,2025-12-21,,Pending,2025-12-20,,task-1"],
    );

    let output = run(&store_path, &["done", "task-1"]);
    let stored = rows(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Completed task: Water plants (task-1)"));
    assert_eq!(stored[0][4], "Completed");
    let stamp = &stored[0][6];
    assert_eq!(stamp.len(), "2025-12-20 10:00:00".len());
    assert_eq!(&stamp[4..5], "-");
    assert_eq!(&stamp[10..11], " ");
}

#[test]
fn done_command_rejects_already_completed() {
    let store_path = temp_path("cli-done-completed.csv");
    write_store(
        &store_path,
        &["Water plants,Low,2025-12-21,,Completed,2025-12-20,2025-12-21 10:00:00,task-1"],
    );

    let output = run(&store_path, &["done", "task-1"]);
    let stored = rows(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: already_completed"));
    assert_eq!(stored[0][6], "2025-12-21 10:00:00");
}

#[test]
fn done_command_reports_missing_id() {
    let store_path = temp_path("cli-done-missing.csv");
    write_store(&store_path, &[]);

    let output = run(&store_path, &["done", "task-1"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: not_found - task not found: task-1"));
}

#[test]
fn done_all_completes_every_pending_task() {
    let store_path = temp_path("cli-done-all.csv");
    write_store(
        &store_path,
        &[
            "a,Low,2025-12-21,,Pending,2025-12-20,,task-1",
            "b,Low,2025-12-21,,Completed,2025-12-20,2025-12-20 08:00:00,task-2",
            "c,High,2025-12-22,,Pending,2025-12-20,,task-3",
        ],
    );

    let output = run(&store_path, &["done-all"]);
    let stored = rows(&store_path);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Completed 2 task(s)"));
    assert!(stored.iter().all(|row| row[4] == "Completed"));
    assert_eq!(stored[1][6], "2025-12-20 08:00:00");
    assert_eq!(stored[0][6], stored[2][6]);
}
