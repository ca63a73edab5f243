use std::fmt;
use std::io;
use std::os::fd::AsFd;
use std::process::{Command, Output, Stdio};

use crate::core::config::SUDO_BIN;
use crate::core::{GuardError, GuardResult};
use crate::utils::logging::console_uses_stderr;

/// A single external tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Needs root; wrapped in sudo when the runner elevates
    pub privileged: bool,
    /// Inherit the terminal instead of capturing output
    pub interactive: bool,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            privileged: false,
            interactive: false,
        }
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What an external tool left behind. The exit status is the only success signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into ExecutionFailed
    pub fn check(self, invocation: &Invocation) -> GuardResult<Self> {
        if self.success() {
            return Ok(self);
        }
        let mut message = match self.code {
            Some(code) => format!("'{}' exited with status {}", invocation, code),
            None => format!("'{}' was terminated by a signal", invocation),
        };
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            message.push_str(": ");
            message.push_str(stderr);
        }
        Err(GuardError::ExecutionFailed(message))
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Seam between audit logic and the host's tools
pub trait CommandRunner {
    /// Run to completion. Errors only when the tool could not be started;
    /// a non-zero exit is reported through the output.
    fn run(&mut self, invocation: &Invocation) -> GuardResult<CommandOutput>;
}

/// Runs tools on the local host, blocking until they exit
#[derive(Debug, Clone)]
pub struct SystemRunner {
    elevate: bool,
}

impl SystemRunner {
    /// `elevate` prefixes privileged invocations with sudo
    pub fn new(elevate: bool) -> Self {
        Self { elevate }
    }

    fn build_command(&self, invocation: &Invocation) -> Command {
        let mut cmd = if invocation.privileged && self.elevate {
            let mut cmd = Command::new(SUDO_BIN);
            cmd.arg(&invocation.program);
            cmd
        } else {
            Command::new(&invocation.program)
        };
        cmd.args(&invocation.args);
        cmd
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, invocation: &Invocation) -> GuardResult<CommandOutput> {
        log::debug!(
            "running {}{}",
            if invocation.privileged && self.elevate { "sudo " } else { "" },
            invocation
        );

        let mut cmd = self.build_command(invocation);

        let output = if invocation.interactive {
            let stdout = if console_uses_stderr() {
                Stdio::from(io::stderr().as_fd().try_clone_to_owned()?)
            } else {
                Stdio::inherit()
            };
            let status = cmd
                .stdin(Stdio::inherit())
                .stdout(stdout)
                .stderr(Stdio::inherit())
                .status()
                .map_err(|e| {
                    GuardError::ExecutionFailed(format!("Failed to execute {}: {}", invocation, e))
                })?;
            CommandOutput {
                code: status.code(),
                ..CommandOutput::default()
            }
        } else {
            cmd.stdin(Stdio::null())
                .output()
                .map(CommandOutput::from)
                .map_err(|e| {
                    GuardError::ExecutionFailed(format!("Failed to execute {}: {}", invocation, e))
                })?
        };

        if !output.success() {
            log::debug!("{} exited with {:?}", invocation, output.code);
        }
        Ok(output)
    }
}
