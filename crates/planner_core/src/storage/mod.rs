use crate::error::AppError;
use crate::model::Task;
use std::path::Path;

pub mod backup;
pub mod csv_store;
pub mod json_store;

pub use csv_store::CsvStore;
pub use json_store::JsonStore;

/// Whole-collection persistence: every save rewrites the full list.
pub trait TaskStorage {
    fn path(&self) -> &Path;

    /// Returns an empty list when nothing has been stored yet.
    fn load(&self) -> Result<Vec<Task>, AppError>;

    fn save(&self, tasks: &[Task]) -> Result<(), AppError>;
}

/// Picks a backend from the file extension: `.json` is a JSON document,
/// anything else is a CSV table.
pub fn open_storage(path: &Path) -> Box<dyn TaskStorage> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Box::new(JsonStore::new(path))
    } else {
        Box::new(CsvStore::new(path))
    }
}

pub(crate) fn write_store_file(path: &Path, content: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn temp_path(file_name: &str) -> std::path::PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("planner-{nanos}-{seq}-{file_name}"))
}

#[cfg(test)]
mod tests {
    use super::{open_storage, temp_path};
    use crate::model::{Priority, Task, TaskStatus};

    fn sample() -> Task {
        Task {
            id: "task-1".to_string(),
            title: "demo".to_string(),
            priority: Priority::Low,
            due_date: "2025-12-20".to_string(),
            note: String::new(),
            status: TaskStatus::Pending,
            created: "2025-12-20".to_string(),
            completed_at: None,
        }
    }

    #[test]
    fn open_storage_selects_backend_by_extension() {
        let json_path = temp_path("tasks.JSON");
        let csv_path = temp_path("tasks.csv");

        open_storage(&json_path).save(&[sample()]).unwrap();
        open_storage(&csv_path).save(&[sample()]).unwrap();
        let json_content = std::fs::read_to_string(&json_path).unwrap();
        let csv_content = std::fs::read_to_string(&csv_path).unwrap();
        std::fs::remove_file(&json_path).ok();
        std::fs::remove_file(&csv_path).ok();

        assert!(json_content.trim_start().starts_with('{'));
        assert!(csv_content.starts_with("Task,Priority,Due Date,Note,Status,Created"));
    }

    #[test]
    fn missing_store_loads_empty() {
        assert!(open_storage(&temp_path("absent.json")).load().unwrap().is_empty());
        assert!(open_storage(&temp_path("absent.csv")).load().unwrap().is_empty());
    }
}
