use crate::error::AppError;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Where copies of the store go and how many of them to retain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
    pub dir: PathBuf,
    pub keep: usize,
}

/// Copies the store into the backup directory and prunes old copies.
///
/// Returns the new backup path, or `None` when there is nothing to back up
/// (no store yet, or `keep == 0`). Backup names carry a UTC stamp.
pub fn backup_store(store_path: &Path, policy: &BackupPolicy) -> Result<Option<PathBuf>, AppError> {
    if policy.keep == 0 || !store_path.exists() {
        return Ok(None);
    }

    std::fs::create_dir_all(&policy.dir).map_err(|err| AppError::io(err.to_string()))?;

    let (stem, extension) = name_parts(store_path);
    let stamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]-[subsecond digits:9]"
        ))
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    let mut target = policy.dir.join(format!("{stem}-{stamp}{extension}"));
    let mut attempt = 1;
    while target.exists() {
        target = policy
            .dir
            .join(format!("{stem}-{stamp}_{attempt}{extension}"));
        attempt += 1;
    }

    std::fs::copy(store_path, &target).map_err(|err| AppError::io(err.to_string()))?;
    tracing::debug!(backup = %target.display(), "backed up task store");

    for removed in prune_backups(store_path, policy)? {
        tracing::debug!(backup = %removed.display(), "removed old backup");
    }

    Ok(Some(target))
}

/// Backups of `store_path` found in `dir`, oldest first.
///
/// Only names of the form `<stem>-<stamp>[_N]<ext>` count, so stores whose
/// stem extends this one (`tasks-2.csv` next to `tasks.csv`) stay separate.
pub fn list_backups(store_path: &Path, dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let (stem, extension) = name_parts(store_path);
    let prefix = format!("{stem}-");
    let entries = std::fs::read_dir(dir).map_err(|err| AppError::io(err.to_string()))?;

    let mut backups = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| AppError::io(err.to_string()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let order = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&extension))
            .and_then(backup_order);
        if let Some(order) = order {
            backups.push((order, entry.path()));
        }
    }

    backups.sort();
    Ok(backups.into_iter().map(|(_, path)| path).collect())
}

/// Parses `<stamp>[_N]` into a sortable key.
fn backup_order(raw: &str) -> Option<(PrimitiveDateTime, u32)> {
    let (stamp, attempt) = match raw.split_once('_') {
        Some((stamp, attempt)) => (stamp, attempt.parse::<u32>().ok()?),
        None => (raw, 0),
    };
    let taken_at = PrimitiveDateTime::parse(
        stamp,
        format_description!("[year][month][day]-[hour][minute][second]-[subsecond digits:9]"),
    )
    .ok()?;
    Some((taken_at, attempt))
}

fn prune_backups(store_path: &Path, policy: &BackupPolicy) -> Result<Vec<PathBuf>, AppError> {
    let backups = list_backups(store_path, &policy.dir)?;
    let excess = backups.len().saturating_sub(policy.keep);

    let mut removed = Vec::with_capacity(excess);
    for path in backups.into_iter().take(excess) {
        std::fs::remove_file(&path).map_err(|err| AppError::io(err.to_string()))?;
        removed.push(path);
    }

    Ok(removed)
}

fn name_parts(store_path: &Path) -> (String, String) {
    let stem = store_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("tasks")
        .to_string();
    let extension = store_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    (stem, extension)
}
