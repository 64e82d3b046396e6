use crate::clock;
use crate::config::Config;
use crate::error::AppError;
use crate::model::{Priority, Task, TaskInput, TaskStatus, generate_task_id, normalize_note};
use crate::stats::{self, Stats};
use crate::storage::backup::{self, BackupPolicy};
use crate::storage::{TaskStorage, open_storage};
use std::collections::HashSet;
use std::path::Path;
use time::Date;

/// List controls; an empty filter matches every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of the title or note.
    pub search: Option<String>,
    pub overdue_only: bool,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, today: Date) -> bool {
        if self.status.is_some_and(|status| status != task.status) {
            return false;
        }
        if self.priority.is_some_and(|priority| priority != task.priority) {
            return false;
        }
        if self.overdue_only && !task.is_overdue(today) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.note.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter, today: Date) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task, today))
        .cloned()
        .collect()
}

/// The task list and its durable copy.
///
/// Every call reads the whole collection from storage; every mutation
/// rewrites it before returning. Failed validation or lookup never writes.
pub struct TaskStore {
    storage: Box<dyn TaskStorage>,
    backup: Option<BackupPolicy>,
}

impl TaskStore {
    pub fn new(storage: Box<dyn TaskStorage>, backup: Option<BackupPolicy>) -> Self {
        Self { storage, backup }
    }

    pub fn open(path: &Path, backup: Option<BackupPolicy>) -> Self {
        Self::new(open_storage(path), backup)
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let path = config.resolved_store_path()?;
        let backup = config.backup_policy(&path);
        Ok(Self::open(&path, backup))
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    pub fn load(&self) -> Result<Vec<Task>, AppError> {
        self.storage.load()
    }

    pub fn get(&self, id: &str) -> Result<Task, AppError> {
        let id = required_id(id)?;
        self.load()?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(id))
    }

    pub fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
        let tasks = self.load()?;
        Ok(filter_tasks(&tasks, filter, clock::today()))
    }

    pub fn stats(&self) -> Result<Stats, AppError> {
        let tasks = self.load()?;
        Ok(stats::compute(&tasks, clock::today()))
    }

    pub fn add(&self, input: &TaskInput) -> Result<Task, AppError> {
        let title = required_title(&input.title)?;
        let mut tasks = self.load()?;

        let taken: HashSet<String> = tasks.iter().map(|task| task.id.clone()).collect();
        let task = Task {
            id: generate_task_id(&taken),
            title,
            priority: input.priority,
            due_date: clock::format_date(input.due_date)?,
            note: normalize_note(&input.note),
            status: TaskStatus::Pending,
            created: clock::format_date(clock::today())?,
            completed_at: None,
        };

        tasks.push(task.clone());
        self.persist(&tasks)?;

        tracing::info!(id = %task.id, "added task");
        Ok(task)
    }

    /// Marks a pending task completed. Completing it a second time is an
    /// error and leaves the original timestamp in place.
    pub fn complete(&self, id: &str) -> Result<Task, AppError> {
        let id = required_id(id)?;
        let mut tasks = self.load()?;

        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(id))?;
        if task.status == TaskStatus::Completed {
            return Err(AppError::already_completed(id));
        }

        task.status = TaskStatus::Completed;
        task.completed_at = Some(clock::format_timestamp(clock::now_timestamp())?);
        let updated = task.clone();
        self.persist(&tasks)?;

        tracing::info!(id = %updated.id, "completed task");
        Ok(updated)
    }

    /// Completes every pending task with one shared timestamp.
    pub fn complete_all_pending(&self) -> Result<Vec<Task>, AppError> {
        let mut tasks = self.load()?;
        if tasks.iter().all(Task::is_completed) {
            return Ok(Vec::new());
        }

        let completed_at = clock::format_timestamp(clock::now_timestamp())?;
        let mut updated = Vec::new();
        for task in tasks.iter_mut().filter(|task| !task.is_completed()) {
            task.status = TaskStatus::Completed;
            task.completed_at = Some(completed_at.clone());
            updated.push(task.clone());
        }
        self.persist(&tasks)?;

        tracing::info!(count = updated.len(), "completed all pending tasks");
        Ok(updated)
    }

    /// Overwrites the editable fields; status, creation date and completion
    /// time are left as they were.
    pub fn edit(&self, id: &str, input: &TaskInput) -> Result<Task, AppError> {
        let id = required_id(id)?;
        let title = required_title(&input.title)?;
        let due_date = clock::format_date(input.due_date)?;
        let mut tasks = self.load()?;

        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(id))?;
        task.title = title;
        task.priority = input.priority;
        task.due_date = due_date;
        task.note = normalize_note(&input.note);
        let updated = task.clone();
        self.persist(&tasks)?;

        tracing::info!(id = %updated.id, "edited task");
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<Task, AppError> {
        let id = required_id(id)?;
        let mut tasks = self.load()?;

        let index = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(id))?;
        let removed = tasks.remove(index);
        self.persist(&tasks)?;

        tracing::info!(id = %removed.id, "deleted task");
        Ok(removed)
    }

    /// Removes every completed task and returns how many were removed.
    pub fn delete_all_completed(&self) -> Result<usize, AppError> {
        let mut tasks = self.load()?;
        let before = tasks.len();
        tasks.retain(|task| !task.is_completed());
        let removed = before - tasks.len();

        if removed > 0 {
            self.persist(&tasks)?;
            tracing::info!(count = removed, "deleted completed tasks");
        }

        Ok(removed)
    }

    fn persist(&self, tasks: &[Task]) -> Result<(), AppError> {
        if let Some(policy) = self.backup.as_ref()
            && let Err(err) = backup::backup_store(self.storage.path(), policy)
        {
            tracing::warn!(error = %err, "task store backup failed");
        }
        self.storage.save(tasks)
    }
}

fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn required_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::EmptyTask);
    }
    Ok(trimmed.to_string())
}
