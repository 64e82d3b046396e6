use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    EmptyTask,
    NotFound(String),
    AlreadyCompleted(String),
    InvalidInput(String),
    InvalidData(String),
    Io(String),
}

impl AppError {
    pub fn not_found<M: Into<String>>(id: M) -> Self {
        Self::NotFound(id.into())
    }

    pub fn already_completed<M: Into<String>>(id: M) -> Self {
        Self::AlreadyCompleted(id.into())
    }

    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyTask => "empty_task",
            Self::NotFound(_) => "not_found",
            Self::AlreadyCompleted(_) => "already_completed",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::EmptyTask => "task name cannot be empty".to_string(),
            Self::NotFound(id) => format!("task not found: {id}"),
            Self::AlreadyCompleted(id) => format!("task already completed: {id}"),
            Self::InvalidInput(message) => message.clone(),
            Self::InvalidData(message) => message.clone(),
            Self::Io(message) => message.clone(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}
