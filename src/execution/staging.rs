//! Backup and validated replacement of root-owned configuration files.
//!
//! Edits are written to a private scratch file, checked by the file's own
//! syntax checker, and only then copied over the live file. The live file
//! is never opened for writing directly.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use crate::core::config::COPY_BIN;
use crate::core::{GuardError, GuardResult};
use crate::execution::{CommandRunner, Invocation};
use crate::utils::{backup_path, scratch_path};

/// Result of the best-effort backup step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupOutcome {
    pub path: PathBuf,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Copy `target` to its timestamped sibling. Never fails the caller;
/// the outcome says whether the copy really happened.
pub fn backup_file(
    runner: &mut dyn CommandRunner,
    target: &Path,
    at: &DateTime<Local>,
) -> BackupOutcome {
    let path = backup_path(target, at);
    let invocation = copy_invocation(target, &path);

    match runner.run(&invocation).and_then(|out| out.check(&invocation)) {
        Ok(_) => BackupOutcome {
            path,
            created: true,
            error: None,
        },
        Err(e) => BackupOutcome {
            path,
            created: false,
            error: Some(e.to_string()),
        },
    }
}

/// How a staged replacement ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum InstallOutcome {
    Installed,
    /// The syntax checker rejected the staged file; the live file is untouched
    Rejected(String),
    /// The validated file could not be copied into place
    CopyFailed(String),
    /// The scratch file could not be written
    StagingFailed(String),
}

/// Write `contents` to a fresh scratch file in `scratch_dir`, run
/// `validator(scratch)`, and copy it over `target` only if validation passes.
/// The scratch file is removed in every case.
pub fn install_validated<F>(
    runner: &mut dyn CommandRunner,
    contents: &str,
    target: &Path,
    scratch_dir: &Path,
    at: &DateTime<Local>,
    validator: F,
) -> InstallOutcome
where
    F: FnOnce(&Path) -> Invocation,
{
    let scratch = scratch_path(scratch_dir, target, at);
    if let Err(e) = write_private(&scratch, contents) {
        return InstallOutcome::StagingFailed(format!(
            "cannot write {}: {}",
            scratch.display(),
            e
        ));
    }

    let outcome = validate_and_copy(runner, &scratch, target, validator);

    if let Err(e) = fs::remove_file(&scratch) {
        log::warn!("could not remove scratch file {}: {}", scratch.display(), e);
    }
    outcome
}

fn validate_and_copy<F>(
    runner: &mut dyn CommandRunner,
    scratch: &Path,
    target: &Path,
    validator: F,
) -> InstallOutcome
where
    F: FnOnce(&Path) -> Invocation,
{
    let check = validator(scratch);
    match runner.run(&check).and_then(|out| out.check(&check)) {
        Ok(_) => log::debug!("{} accepted {}", check.program, scratch.display()),
        Err(e) => return InstallOutcome::Rejected(e.to_string()),
    }

    let copy = copy_invocation(scratch, target);
    match runner.run(&copy).and_then(|out| out.check(&copy)) {
        Ok(_) => InstallOutcome::Installed,
        Err(e) => InstallOutcome::CopyFailed(e.to_string()),
    }
}

/// Create a file only this user can read, refusing to reuse an existing path
fn write_private(path: &Path, contents: &str) -> GuardResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn copy_invocation(from: &Path, to: &Path) -> Invocation {
    Invocation::new(
        COPY_BIN,
        &[&from.display().to_string(), &to.display().to_string()],
    )
    .privileged()
}

/// Read a file directly, falling back to an elevated `cat` when
/// permissions forbid it
pub fn read_protected(runner: &mut dyn CommandRunner, path: &Path) -> GuardResult<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            log::debug!("{} not readable directly, using elevated read", path.display());
            let invocation = Invocation::new(
                crate::core::config::CAT_BIN,
                &[&path.display().to_string()],
            )
            .privileged();
            let output = runner
                .run(&invocation)
                .and_then(|out| out.check(&invocation))
                .map_err(|err| {
                    GuardError::IoError(std::io::Error::new(
                        std::io::ErrorKind::PermissionDenied,
                        format!("cannot read {}: {}", path.display(), err),
                    ))
                })?;
            Ok(output.stdout)
        }
        Err(e) => Err(GuardError::IoError(std::io::Error::new(
            e.kind(),
            format!("cannot read {}: {}", path.display(), e),
        ))),
    }
}
