use crate::clock;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use time::{Date, OffsetDateTime};

/// One entry in the task list.
///
/// Dates are kept in their persisted text form so a single malformed value
/// never prevents the rest of the store from loading; use the `*_on`
/// accessors to get typed dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub priority: Priority,
    pub due_date: String,
    #[serde(default)]
    pub note: String,
    pub status: TaskStatus,
    pub created: String,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Task {
    pub fn due_on(&self) -> Option<Date> {
        clock::parse_date(&self.due_date)
    }

    pub fn created_on(&self) -> Option<Date> {
        clock::parse_date(&self.created)
    }

    /// Day component of `completed_at`, if present and well formed.
    pub fn completed_on(&self) -> Option<Date> {
        self.completed_at
            .as_deref()
            .and_then(clock::parse_timestamp)
            .map(|timestamp| timestamp.date())
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        self.status == TaskStatus::Pending && self.due_on().is_some_and(|due| due < today)
    }
}

/// User-editable fields, shared by add and edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub priority: Priority,
    pub due_date: Date,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(AppError::invalid_input(format!(
                "unknown priority '{other}' (expected Low, Medium or High)"
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(AppError::invalid_input(format!(
                "unknown status '{other}' (expected Pending or Completed)"
            ))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapses line breaks to single spaces and trims the result.
pub fn normalize_note(note: &str) -> String {
    note.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Generates a `task-<nanos>` id that does not collide with `taken`.
pub fn generate_task_id(taken: &HashSet<String>) -> String {
    let mut nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    loop {
        let id = format!("task-{nanos}");
        if !taken.contains(&id) {
            return id;
        }
        nanos += 1;
    }
}
