use crate::error::AppError;
use crate::model::{Priority, Task, TaskStatus, generate_task_id};
use crate::storage::{TaskStorage, write_store_file};
use csv::StringRecord;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const TASK: &str = "Task";
const PRIORITY: &str = "Priority";
const DUE_DATE: &str = "Due Date";
const NOTE: &str = "Note";
const STATUS: &str = "Status";
const CREATED: &str = "Created";
const COMPLETED_TS: &str = "Completed_TS";
const ID: &str = "Id";

/// Header row written on every save, in column order.
pub const COLUMNS: [&str; 8] = [
    TASK,
    PRIORITY,
    DUE_DATE,
    NOTE,
    STATUS,
    CREATED,
    COMPLETED_TS,
    ID,
];

#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl TaskStorage for CsvStore {
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

/// Column positions resolved from the header row. Older stores may lack
/// `Completed_TS` and `Id`.
struct ColumnIndex {
    task: usize,
    priority: usize,
    due_date: usize,
    note: usize,
    status: usize,
    created: usize,
    completed_ts: Option<usize>,
    id: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, AppError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim_start_matches('\u{feff}').trim() == name)
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| AppError::invalid_data(format!("missing column '{name}'")))
        };

        Ok(Self {
            task: required(TASK)?,
            priority: required(PRIORITY)?,
            due_date: required(DUE_DATE)?,
            note: required(NOTE)?,
            status: required(STATUS)?,
            created: required(CREATED)?,
            completed_ts: find(COMPLETED_TS),
            id: find(ID),
        })
    }
}

/// Loads the table, adding any missing `Completed_TS`/`Id` column and
/// rewriting the file when that happens.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    let (tasks, migrated) = read_tasks(path)?;
    if migrated {
        tracing::info!(path = %path.display(), "upgrading task table columns");
        save_tasks(path, &tasks)?;
    }
    Ok(tasks)
}

fn read_tasks(path: &Path) -> Result<(Vec<Task>, bool), AppError> {
    if !path.exists() {
        return Ok((Vec::new(), false));
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    if content.trim().is_empty() {
        return Ok((Vec::new(), false));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader.headers().map_err(csv_error)?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut migrated = columns.completed_ts.is_none() || columns.id.is_none();
    let mut taken = HashSet::new();
    let mut tasks = Vec::new();

    for (offset, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let line = record
            .position()
            .map_or(offset as u64 + 2, |position| position.line());
        let field = |index: usize| record.get(index).unwrap_or("").trim().to_string();

        let priority = field(columns.priority)
            .parse::<Priority>()
            .map_err(|err| row_error(line, &err))?;
        let status = field(columns.status)
            .parse::<TaskStatus>()
            .map_err(|err| row_error(line, &err))?;
        let completed_at = columns
            .completed_ts
            .map(|index| field(index))
            .filter(|value| !value.is_empty());

        let id = match columns
            .id
            .map(|index| field(index))
            .filter(|value| !value.is_empty() && !taken.contains(value))
        {
            Some(id) => id,
            None => {
                migrated = true;
                generate_task_id(&taken)
            }
        };
        taken.insert(id.clone());

        let task = Task {
            id,
            title: field(columns.task),
            priority,
            due_date: field(columns.due_date),
            note: field(columns.note),
            status,
            created: field(columns.created),
            completed_at,
        };

        if task.due_on().is_none()
            || task.created_on().is_none()
            || (task.completed_at.is_some() && task.completed_on().is_none())
        {
            tracing::warn!(line, id = %task.id, "task row has an unparseable date");
        }

        tasks.push(task);
    }

    tracing::debug!(path = %path.display(), count = tasks.len(), migrated, "loaded csv store");
    Ok((tasks, migrated))
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS).map_err(csv_error)?;

    for task in tasks {
        writer
            .write_record([
                task.title.as_str(),
                task.priority.as_str(),
                task.due_date.as_str(),
                task.note.as_str(),
                task.status.as_str(),
                task.created.as_str(),
                task.completed_at.as_deref().unwrap_or(""),
                task.id.as_str(),
            ])
            .map_err(csv_error)?;
    }

    let content = writer
        .into_inner()
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    write_store_file(path, &content)?;

    tracing::debug!(path = %path.display(), count = tasks.len(), "saved csv store");
    Ok(())
}

fn csv_error(err: csv::Error) -> AppError {
    if err.is_io_error() {
        AppError::io(err.to_string())
    } else {
        AppError::invalid_data(err.to_string())
    }
}

fn row_error(line: u64, err: &AppError) -> AppError {
    AppError::invalid_data(format!("line {line}: {}", err.message()))
}
