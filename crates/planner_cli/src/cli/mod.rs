use clap::{Parser, Subcommand};
use planner_core::clock;
use planner_core::config::ConfigOverrides;
use planner_core::error::AppError;
use planner_core::model::{Priority, TaskStatus};
use std::path::PathBuf;
use time::{Date, Duration};

#[derive(Parser, Debug)]
#[command(author, version, about = "Daily planner and task logger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: planner add "Buy milk" --priority high --due 2025-12-24
    Add {
        title: Option<String>,
        #[arg(short, long, value_parser = parse_priority, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD, "today" or "tomorrow"); defaults to today
        #[arg(short, long, value_parser = parse_due_date)]
        due: Option<Date>,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// List tasks
    ///
    /// Example: planner list --status pending --priority high
    /// Example: planner list --search invoice --overdue
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// Case-insensitive text to look for in the task name or note
        #[arg(long)]
        search: Option<String>,
        /// Only pending tasks past their due date
        #[arg(long)]
        overdue: bool,
    },
    /// Show details of a task
    ///
    /// Example: planner show task-1734700000000000000
    Show { id: String },
    /// Mark a task as completed
    ///
    /// Example: planner done task-1734700000000000000
    Done { id: String },
    /// Mark every pending task as completed
    DoneAll,
    /// Edit a task; fields that are not given keep their current value
    ///
    /// Example: planner edit task-1734700000000000000 --title "Buy oat milk" --due tomorrow
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,
        #[arg(short, long, value_parser = parse_due_date)]
        due: Option<Date>,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: planner delete task-1734700000000000000
    Delete { id: String },
    /// Delete every completed task
    ClearCompleted,
    /// Show the completion streak and 30-day summary
    Stats,
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    raw.parse::<Priority>().map_err(|err| err.message())
}

fn parse_status(raw: &str) -> Result<TaskStatus, String> {
    raw.parse::<TaskStatus>().map_err(|err| err.message())
}

fn parse_due_date(raw: &str) -> Result<Date, String> {
    let today = clock::today();
    match raw.trim().to_ascii_lowercase().as_str() {
        "today" => Ok(today),
        "tomorrow" => Ok(today + Duration::days(1)),
        _ => clock::parse_date(raw)
            .ok_or_else(|| format!("invalid date '{raw}' (expected YYYY-MM-DD)")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StorePath,
    BackupEnabled,
    BackupDir,
    BackupKeep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "store_path" | "store" => {
            if remainder.is_some() {
                return Err("store_path override cannot have subfields".to_string());
            }
            ConfigOverrideTarget::StorePath
        }
        "backup" => {
            let subfield = remainder
                .and_then(canonicalize_flag_name)
                .ok_or_else(|| "backup override requires a field name".to_string())?;
            match subfield.as_str() {
                "enabled" => ConfigOverrideTarget::BackupEnabled,
                "dir" => ConfigOverrideTarget::BackupDir,
                "keep" => ConfigOverrideTarget::BackupKeep,
                other => return Err(format!("unknown backup field '{other}'")),
            }
        }
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` argument into one set of overrides.
pub fn build_overrides(raw_overrides: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for raw in raw_overrides {
        let parsed = parse_config_override(raw).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(non_empty(&parsed.value, "store_path")?));
            }
            ConfigOverrideTarget::BackupDir => {
                overrides.backup_dir = Some(PathBuf::from(non_empty(&parsed.value, "backup.dir")?));
            }
            ConfigOverrideTarget::BackupEnabled => {
                overrides.backup_enabled = Some(parse_bool(&parsed.value)?);
            }
            ConfigOverrideTarget::BackupKeep => {
                let keep = parsed.value.parse::<usize>().map_err(|_| {
                    AppError::invalid_input(format!(
                        "backup.keep must be a non-negative integer, got '{}'",
                        parsed.value
                    ))
                })?;
                overrides.backup_keep = Some(keep);
            }
        }
    }

    Ok(overrides)
}

fn non_empty<'a>(value: &'a str, key: &str) -> Result<&'a str, AppError> {
    if value.is_empty() {
        return Err(AppError::invalid_input(format!("{key} override needs a value")));
    }
    Ok(value)
}

fn parse_bool(value: &str) -> Result<bool, AppError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(AppError::invalid_input(format!(
            "expected a boolean, got '{value}'"
        ))),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
