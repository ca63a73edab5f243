use chrono::Local;
use std::fs::{DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use crate::core::config::{SSHD_BIN, SSHD_UNIT_CANDIDATES, SYSTEMCTL_BIN};
use crate::core::{GuardResult, Recommendation, ServiceStatus, Settings};
use crate::execution::{
    backup_file, install_validated, read_protected, BackupOutcome, CommandRunner, InstallOutcome,
    Invocation,
};
use crate::prompt::Prompter;
use crate::ssh::config::SshdConfig;
use crate::utils::{log_message, LogLevel};

/// Settings applied whenever the SSH server stays in use
pub const DEFAULT_HARDENING: &[(&str, &str)] = &[
    ("PermitRootLogin", "no"),
    ("MaxAuthTries", "3"),
    ("AllowAgentForwarding", "no"),
    ("AllowStreamLocalForwarding", "no"),
    ("AllowTcpForwarding", "no"),
];

/// Settings for key-only authentication
pub const KEY_ONLY_AUTH: &[(&str, &str)] = &[
    ("PubkeyAuthentication", "yes"),
    ("PasswordAuthentication", "no"),
    ("KbdInteractiveAuthentication", "no"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshRunReport {
    pub backup: BackupOutcome,
    pub service: Option<ServiceStatus>,
    pub install: Option<InstallOutcome>,
    pub restarted: bool,
    pub recommendations: Vec<Recommendation>,
}

/// Work out the SSH unit name from the systemd unit files present
pub fn detect_service_name(candidates: &[(PathBuf, String)]) -> Option<String> {
    candidates
        .iter()
        .find(|(unit, _)| unit.is_file())
        .map(|(_, name)| name.clone())
}

/// Interactive review of the SSH server and its configuration
pub struct SshConfigurer<'a> {
    settings: &'a Settings,
    runner: &'a mut dyn CommandRunner,
    prompter: &'a mut dyn Prompter,
    unit_candidates: Vec<(PathBuf, String)>,
    ssh_dir: Option<PathBuf>,
    recommendations: Vec<Recommendation>,
}

impl<'a> SshConfigurer<'a> {
    pub fn new(
        settings: &'a Settings,
        runner: &'a mut dyn CommandRunner,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            settings,
            runner,
            prompter,
            unit_candidates: SSHD_UNIT_CANDIDATES
                .iter()
                .map(|(path, name)| (PathBuf::from(path), name.to_string()))
                .collect(),
            ssh_dir: crate::utils::system::home_dir().map(|home| Path::new(&home).join(".ssh")),
            recommendations: Vec::new(),
        }
    }

    pub fn with_unit_candidates(mut self, candidates: Vec<(PathBuf, String)>) -> Self {
        self.unit_candidates = candidates;
        self
    }

    pub fn with_ssh_dir(mut self, dir: PathBuf) -> Self {
        self.ssh_dir = Some(dir);
        self
    }

    pub fn run(mut self) -> GuardResult<SshRunReport> {
        let path = self.settings.sshd_config.clone();
        let backup = backup_file(self.runner, &path, &Local::now());
        if backup.created {
            log_message(
                LogLevel::Info,
                &format!("Backup created at {}", backup.path.display()),
            );
        } else {
            log_message(
                LogLevel::Warning,
                &format!("Could not back up {}", path.display()),
            );
        }

        let mut config = SshdConfig::parse(&read_protected(self.runner, &path)?);

        let service = match detect_service_name(&self.unit_candidates) {
            Some(name) => {
                let mut status = self.check_status(&name);
                self.audit_service(&mut status)?;
                Some(status)
            }
            None => {
                log_message(LogLevel::Info, "No SSH server unit found");
                None
            }
        };

        if service.as_ref().map_or(false, ServiceStatus::running_or_enabled) {
            self.audit_config(&mut config)?;
        }

        let mut install = None;
        let mut restarted = false;
        if config.is_changed() {
            let outcome = self.write_config(&path, &config);
            if outcome == InstallOutcome::Installed {
                if let Some(status) = &service {
                    restarted = self.restart(&status.name);
                }
            }
            install = Some(outcome);
        }

        Ok(SshRunReport {
            backup,
            service,
            install,
            restarted,
            recommendations: self.recommendations,
        })
    }

    fn systemctl(&mut self, args: &[&str], privileged: bool) -> bool {
        let mut invocation = Invocation::new(SYSTEMCTL_BIN, args);
        if privileged {
            invocation = invocation.privileged();
        }
        match self.runner.run(&invocation) {
            Ok(output) => output.success(),
            Err(e) => {
                log::warn!(target: "ssh", "{}", e);
                false
            }
        }
    }

    fn check_status(&mut self, name: &str) -> ServiceStatus {
        let mut status = ServiceStatus::new(name);
        status.active = self.systemctl(&["is-active", "--quiet", name], false);
        status.enabled = self.systemctl(&["is-enabled", "--quiet", name], false);
        log::info!(target: "ssh", "{:?}", status);
        status
    }

    fn audit_service(&mut self, status: &mut ServiceStatus) -> GuardResult<()> {
        let necessary = self
            .prompter
            .confirm("Is SSH a necessary service?", Some(true))?;

        if necessary && !status.enabled {
            log_message(LogLevel::Warning, "SSH Server doesn't automatically run on startup.");
            if self
                .prompter
                .confirm("Would you like to make it run on startup?", Some(true))?
            {
                if self.systemctl(&["enable", status.name.as_str()], true) {
                    log_message(LogLevel::Pass, "Successfully enabled SSH Server");
                    status.enabled = true;
                } else {
                    log_message(
                        LogLevel::Error,
                        "Failed to enable SSH server, please diagnose manually",
                    );
                }
            }
        }

        if necessary && !status.active {
            log_message(LogLevel::Warning, "SSH Server isn't running currently");
            if self.prompter.confirm("Would you like to start it?", Some(true))? {
                if self.systemctl(&["start", status.name.as_str()], true) {
                    log_message(LogLevel::Pass, "Successfully started SSH Server");
                    status.active = true;
                } else {
                    log_message(
                        LogLevel::Error,
                        "Failed to start SSH server, please diagnose manually",
                    );
                }
            }
        }

        if !necessary && status.running_or_enabled() {
            log_message(
                LogLevel::Warning,
                "SSH Server is running or will run on startup",
            );
            if self
                .prompter
                .confirm("Would you like to turn it off?", Some(true))?
            {
                if self.systemctl(&["disable", "--now", status.name.as_str()], true) {
                    log_message(LogLevel::Pass, "Successfully stopped and disabled SSH Server");
                    status.active = false;
                    status.enabled = false;
                } else {
                    log_message(
                        LogLevel::Error,
                        "Failed to stop and disable SSH server, please diagnose manually",
                    );
                }
            }
        }
        Ok(())
    }

    fn audit_config(&mut self, config: &mut SshdConfig) -> GuardResult<()> {
        for (keyword, argument) in DEFAULT_HARDENING {
            config.set(keyword, argument);
        }

        if self.prompter.confirm(
            "Would you like to disable passwords and require SSH keys?",
            Some(false),
        )? {
            self.require_keys(config)?;
        }

        if self
            .prompter
            .confirm("Would you like to disable ipv6?", Some(true))?
        {
            config.set("AddressFamily", "inet");
        }
        Ok(())
    }

    fn defer_keys(&mut self) {
        log_message(LogLevel::Info, "Please manually set up SSH keys later");
        self.recommendations.push(Recommendation::advisory(
            "Set up SSH key authentication and disable password logins",
        ));
    }

    fn require_keys(&mut self, config: &mut SshdConfig) -> GuardResult<()> {
        log_message(
            LogLevel::Info,
            "In order to set this option, you need an SSH key pair",
        );
        if !self
            .prompter
            .confirm("Do you still want to move forward?", Some(false))?
        {
            self.defer_keys();
            return Ok(());
        }

        log_message(LogLevel::Info, "Use `ssh-keygen` to generate key pair");
        let key = self
            .prompter
            .read_line("Copy and paste everything in the .pub file:")?;
        if key.is_empty() {
            self.defer_keys();
            return Ok(());
        }

        if let Err(e) = self.authorize_key(&key) {
            log_message(
                LogLevel::Error,
                &format!("Could not add key to authorized_keys: {}", e),
            );
            self.defer_keys();
            return Ok(());
        }

        log_message(
            LogLevel::Info,
            "Please SSH to the server and ensure that you can log in",
        );
        if !self
            .prompter
            .confirm("Are you ready to require keys?", Some(false))?
        {
            self.defer_keys();
            return Ok(());
        }

        for (keyword, argument) in KEY_ONLY_AUTH {
            config.set(keyword, argument);
        }
        Ok(())
    }

    /// Append a public key to ~/.ssh/authorized_keys, creating ~/.ssh as 0700
    fn authorize_key(&self, key: &str) -> GuardResult<()> {
        let dir = self.ssh_dir.as_ref().ok_or_else(|| {
            crate::core::GuardError::Config("cannot determine home directory".to_string())
        })?;
        if !dir.is_dir() {
            DirBuilder::new().recursive(true).mode(0o700).create(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("authorized_keys"))?;
        writeln!(file, "{}", key)?;
        Ok(())
    }

    fn write_config(&mut self, path: &Path, config: &SshdConfig) -> InstallOutcome {
        let outcome = install_validated(
            self.runner,
            &config.render(),
            path,
            &self.settings.scratch_dir,
            &Local::now(),
            |scratch| {
                Invocation::new(SSHD_BIN, &["-t", "-f", &scratch.display().to_string()])
                    .privileged()
            },
        );

        match &outcome {
            InstallOutcome::Installed => {
                log_message(LogLevel::Pass, "Successfully configured SSH Server")
            }
            InstallOutcome::Rejected(reason) => {
                log::error!(target: "ssh", "sshd rejected staged config: {}", reason);
                log_message(
                    LogLevel::Error,
                    "New SSH configuration failed 'sshd -t', nothing was changed",
                );
            }
            InstallOutcome::CopyFailed(_) | InstallOutcome::StagingFailed(_) => {
                log_message(LogLevel::Error, "Failure to configure SSH server")
            }
        }
        outcome
    }

    fn restart(&mut self, name: &str) -> bool {
        let restarted = self.systemctl(&["restart", name], true);
        if restarted {
            log_message(LogLevel::Pass, "Successfully restarted SSH Server");
        } else {
            log_message(
                LogLevel::Error,
                "Failure to restart SSH server, you might need to restore backup",
            );
            self.recommendations.push(Recommendation::advisory(format!(
                "Restart the SSH server ({}) or restore its configuration from backup",
                name
            )));
        }
        restarted
    }
}
