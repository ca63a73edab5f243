use chrono::{DateTime, TimeZone};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::config::{BACKUP_SUFFIX, BACKUP_TIMESTAMP_FORMAT};

/// Sibling backup path: <file>.<YYYY-MM-DD_HH:MM:SS>.bkp
pub fn backup_path<Tz: TimeZone>(file: &Path, at: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    append_to_file_name(
        file,
        &format!(".{}.{}", at.format(BACKUP_TIMESTAMP_FORMAT), BACKUP_SUFFIX),
    )
}

/// Glob pattern matching every backup of `file`
pub fn backup_glob(file: &Path) -> String {
    format!("{}.*.{}", file.display(), BACKUP_SUFFIX)
}

/// Scratch file for staging edits, unique per process and moment
pub fn scratch_path<Tz: TimeZone>(dir: &Path, file: &Path, at: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let stem = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "staged".to_string());
    dir.join(format!(
        "hardn-guard-{}.{}.{}",
        stem,
        std::process::id(),
        at.format("%Y%m%d%H%M%S%.f")
    ))
}

fn append_to_file_name(file: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = file.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
