use chrono::Local;
use serde::Serialize;
use std::path::Path;

use crate::core::config::VISUDO_BIN;
use crate::core::{GuardResult, Recommendation, Settings};
use crate::execution::{
    backup_file, install_validated, read_protected, BackupOutcome, CommandRunner, InstallOutcome,
    Invocation,
};
use crate::prompt::Prompter;
use crate::sudoers::audit::{AuditReport, AuditSession};
use crate::sudoers::parser;
use crate::utils::logging::console_line;
use crate::utils::{log_message, LogLevel};

/// What happened to the live file at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    /// Nothing was removed, so nothing was written
    NotNeeded,
    Attempted(InstallOutcome),
}

/// Result of a full sudoers audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SudoersRunReport {
    pub file: String,
    pub backup: BackupOutcome,
    pub include_directives: Vec<String>,
    #[serde(flatten)]
    pub audit: AuditReport,
    pub commit: CommitStatus,
}

impl SudoersRunReport {
    pub fn recommendations(&self) -> &[Recommendation] {
        &self.audit.recommendations
    }
}

/// Backup, read, parse, audit and (if anything changed) validated write
/// of the sudoers file
pub struct SudoersAuditor<'a> {
    settings: &'a Settings,
    operator: String,
    runner: &'a mut dyn CommandRunner,
    prompter: &'a mut dyn Prompter,
}

impl<'a> SudoersAuditor<'a> {
    pub fn new(
        settings: &'a Settings,
        operator: &str,
        runner: &'a mut dyn CommandRunner,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            settings,
            operator: operator.to_string(),
            runner,
            prompter,
        }
    }

    /// Read and parse failures abort before anything is asked or written
    pub fn run(&mut self) -> GuardResult<SudoersRunReport> {
        let sudoers = self.settings.sudoers_file.as_path();
        let started = Local::now();

        let backup = self.backup(sudoers, &started);

        let raw_text = read_protected(self.runner, sudoers)?;
        let mut table = parser::parse(&raw_text)?;
        log::info!(
            target: "sudoers",
            "{}: {} entries, include dirs {:?}",
            sudoers.display(),
            table.entries().len(),
            table.include_directives()
        );

        let mut audit = AuditSession::new(
            &self.operator,
            &self.settings.protected_names,
            self.runner,
            self.prompter,
        )
        .run(&mut table)?;

        if !backup.created {
            audit.recommendations.push(Recommendation::advisory(format!(
                "Create a backup of {} before making manual changes",
                sudoers.display()
            )));
        }

        let commit = if table.is_dirty() {
            console_line("");
            self.commit(sudoers, &table.raw_text())
        } else {
            log::info!(target: "sudoers", "no changes, {} left as is", sudoers.display());
            CommitStatus::NotNeeded
        };

        Ok(SudoersRunReport {
            file: sudoers.display().to_string(),
            backup,
            include_directives: table.include_directives().to_vec(),
            audit,
            commit,
        })
    }

    fn backup(&mut self, sudoers: &Path, at: &chrono::DateTime<Local>) -> BackupOutcome {
        let outcome = backup_file(self.runner, sudoers, at);
        if outcome.created {
            log_message(
                LogLevel::Info,
                &format!("Backup created at {}", outcome.path.display()),
            );
        } else {
            log_message(
                LogLevel::Warning,
                &format!(
                    "Could not back up {} to {}: {}",
                    sudoers.display(),
                    outcome.path.display(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                ),
            );
        }
        outcome
    }

    fn commit(&mut self, sudoers: &Path, contents: &str) -> CommitStatus {
        let outcome = install_validated(
            self.runner,
            contents,
            sudoers,
            &self.settings.scratch_dir,
            &Local::now(),
            |scratch| {
                Invocation::new(VISUDO_BIN, &["-c", "-f", &scratch.display().to_string()])
                    .privileged()
            },
        );

        match &outcome {
            InstallOutcome::Installed => log_message(
                LogLevel::Pass,
                &format!("Successfully edited '{}'", sudoers.display()),
            ),
            InstallOutcome::Rejected(reason) => {
                log::error!(target: "sudoers", "visudo rejected staged file: {}", reason);
                log_message(
                    LogLevel::Error,
                    "Failed 'visudo' checks, please make changes manually",
                );
            }
            InstallOutcome::CopyFailed(reason) => {
                log::error!(target: "sudoers", "copy failed: {}", reason);
                log_message(
                    LogLevel::Error,
                    &format!(
                        "Failed to write changes to '{}', please make changes manually",
                        sudoers.display()
                    ),
                );
            }
            InstallOutcome::StagingFailed(reason) => {
                log_message(
                    LogLevel::Error,
                    &format!("Could not stage changes ({}), please make changes manually", reason),
                );
            }
        }
        CommitStatus::Attempted(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sudoers::audit::EntryOutcome;
    use crate::testing::{copy_files, ScriptedPrompter, ScriptedRunner};
    use std::fs;
    use std::path::PathBuf;

    struct Host {
        _dir: tempfile::TempDir,
        settings: Settings,
    }

    fn host(sudoers: &str) -> Host {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("sudoers");
        fs::write(&file, sudoers).unwrap();
        let scratch = dir.path().join("scratch");
        fs::create_dir(&scratch).unwrap();

        let settings = Settings {
            sudoers_file: file,
            scratch_dir: scratch,
            ..Settings::default()
        };
        Host { _dir: dir, settings }
    }

    fn sudoers_path(host: &Host) -> PathBuf {
        host.settings.sudoers_file.clone()
    }

    fn programs(runner: &ScriptedRunner) -> Vec<String> {
        runner.log.borrow().iter().map(|i| i.program.clone()).collect()
    }

    #[test]
    fn nothing_removed_means_no_commit() {
        let host = host("root\tALL=(ALL:ALL) ALL\n%sudo\tALL=(ALL:ALL) ALL\n");
        let mut runner = ScriptedRunner::default()
            .on("cp", copy_files)
            .reply("getent", 0, "sudo:x:27:alice\n");
        let mut prompter = ScriptedPrompter::new(&[true, true, true]);

        let report = SudoersAuditor::new(&host.settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect("run completes");

        assert_eq!(report.commit, CommitStatus::NotNeeded);
        assert!(report.backup.created);
        assert_eq!(programs(&runner), vec!["cp", "getent"]);
        assert!(report.audit.entries.iter().all(|e| e.outcome == EntryOutcome::Kept));
    }

    #[test]
    fn removed_group_is_validated_and_installed() {
        let host = host("root\tALL=(ALL:ALL) ALL\n%devops\tALL=(ALL:ALL) ALL\n");
        let mut runner = ScriptedRunner::default().on("cp", copy_files);
        let mut prompter = ScriptedPrompter::new(&[true, false, true]);

        let report = SudoersAuditor::new(&host.settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect("run completes");

        assert_eq!(report.commit, CommitStatus::Attempted(InstallOutcome::Installed));
        assert_eq!(
            fs::read_to_string(sudoers_path(&host)).unwrap(),
            "root\tALL=(ALL:ALL) ALL\n"
        );
        assert_eq!(programs(&runner), vec!["cp", "visudo", "cp"]);

        let log = runner.log.borrow();
        assert_eq!(log[1].args[0..2], ["-c", "-f"]);
        assert!(fs::read_dir(&host.settings.scratch_dir).unwrap().next().is_none());
    }

    #[test]
    fn failed_validation_leaves_live_file_alone() {
        let original = "root\tALL=(ALL:ALL) ALL\n%devops\tALL=(ALL:ALL) ALL\n";
        let host = host(original);
        let mut runner = ScriptedRunner::default()
            .on("cp", copy_files)
            .reply("visudo", 1, "");
        let mut prompter = ScriptedPrompter::new(&[true, false, true]);

        let report = SudoersAuditor::new(&host.settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect("run completes");

        assert!(matches!(
            report.commit,
            CommitStatus::Attempted(InstallOutcome::Rejected(_))
        ));
        assert_eq!(fs::read_to_string(sudoers_path(&host)).unwrap(), original);
        assert_eq!(programs(&runner), vec!["cp", "visudo"]);
        assert!(fs::read_dir(&host.settings.scratch_dir).unwrap().next().is_none());
    }

    #[test]
    fn include_directives_are_reported() {
        let host = host("#includedir /etc/sudoers.d\n");
        let mut runner = ScriptedRunner::default().on("cp", copy_files);
        let mut prompter = ScriptedPrompter::new(&[]);

        let report = SudoersAuditor::new(&host.settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect("run completes");

        assert_eq!(report.include_directives, vec!["/etc/sudoers.d"]);
        assert!(report.audit.entries.is_empty());
    }

    #[test]
    fn failed_backup_is_not_fatal_but_recommended() {
        let host = host("root\tALL=(ALL:ALL) ALL\n");
        let mut runner = ScriptedRunner::default().reply("cp", 1, "");
        let mut prompter = ScriptedPrompter::new(&[true]);

        let report = SudoersAuditor::new(&host.settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect("run completes");

        assert!(!report.backup.created);
        assert!(report.recommendations()[0]
            .message
            .starts_with("Create a backup of"));
    }

    #[test]
    fn unparseable_table_aborts_before_any_question() {
        let host = host("root ALL=(ALL:ALL) ALL\n");
        let mut runner = ScriptedRunner::default().on("cp", copy_files);
        let mut prompter = ScriptedPrompter::new(&[true]);

        let err = SudoersAuditor::new(&host.settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect_err("parse fails");

        assert!(err.is_fatal());
        assert!(prompter.questions.borrow().is_empty());
    }

    #[test]
    fn missing_table_is_fatal() {
        let settings = Settings {
            sudoers_file: PathBuf::from("/nonexistent/sudoers"),
            ..Settings::default()
        };
        let mut runner = ScriptedRunner::default();
        let mut prompter = ScriptedPrompter::new(&[]);

        let err = SudoersAuditor::new(&settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect_err("read fails");
        assert!(err.is_fatal());
    }

    #[test]
    fn report_serialises_for_json_output() {
        let host = host("%devops\tALL=(ALL:ALL) ALL\n");
        let mut runner = ScriptedRunner::default().on("cp", copy_files);
        let mut prompter = ScriptedPrompter::new(&[false, false]);

        let report = SudoersAuditor::new(&host.settings, "alice", &mut runner, &mut prompter)
            .run()
            .expect("run completes");
        let json = serde_json::to_value(&report).expect("serialises");

        assert_eq!(json["commit"], "not_needed");
        assert_eq!(json["entries"][0]["name"], "devops");
        assert_eq!(json["entries"][0]["kind"], "group");
        assert_eq!(json["entries"][0]["outcome"], "flagged_manual");
        assert_eq!(json["recommendations"][0]["urgency"], "advisory");
    }
}
