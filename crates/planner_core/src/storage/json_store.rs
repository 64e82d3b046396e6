use crate::error::AppError;
use crate::model::Task;
use crate::storage::{TaskStorage, write_store_file};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl TaskStorage for JsonStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Task>, AppError> {
        load_tasks(&self.path)
    }

    fn save(&self, tasks: &[Task]) -> Result<(), AppError> {
        save_tasks(&self.path, tasks)
    }
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredTasks =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    tracing::debug!(path = %path.display(), count = stored.tasks.len(), "loaded json store");
    Ok(stored.tasks)
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        tasks: tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    write_store_file(path, content.as_bytes())?;

    tracing::debug!(path = %path.display(), count = tasks.len(), "saved json store");
    Ok(())
}
