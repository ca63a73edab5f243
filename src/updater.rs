use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::core::config::{APT_BIN, DNF_BIN};
use crate::core::GuardResult;
use crate::execution::{CommandRunner, Invocation};
use crate::utils::system::read_os_release;
use crate::utils::{log_message, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Debian,
    Fedora,
    Other,
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Distro::Debian => write!(f, "Debian"),
            Distro::Fedora => write!(f, "Fedora"),
            Distro::Other => write!(f, "Other"),
        }
    }
}

impl Distro {
    /// Classify by `ID`, then by any word of `ID_LIKE`
    pub fn from_os_release(release: &HashMap<String, String>) -> Self {
        let id = release.get("ID").map(String::as_str).unwrap_or("");
        let like = release.get("ID_LIKE").map(String::as_str).unwrap_or("");

        std::iter::once(id)
            .chain(like.split_whitespace())
            .find_map(|name| match name {
                "debian" => Some(Distro::Debian),
                "fedora" => Some(Distro::Fedora),
                _ => None,
            })
            .unwrap_or(Distro::Other)
    }

    pub fn detect(os_release: &Path) -> Self {
        Self::from_os_release(&read_os_release(os_release))
    }

    fn update_commands(self) -> Vec<Invocation> {
        match self {
            Distro::Debian => vec![
                Invocation::new(APT_BIN, &["update", "-y"]),
                Invocation::new(APT_BIN, &["upgrade", "-y"]),
            ],
            Distro::Fedora => vec![Invocation::new(DNF_BIN, &["upgrade", "-y"])],
            Distro::Other => Vec::new(),
        }
        .into_iter()
        .map(|invocation| invocation.privileged().interactive())
        .collect()
    }
}

/// Bring installed packages up to date with the distribution's package
/// manager. Returns false when the distribution is unsupported or a step fails.
pub fn update_system(runner: &mut dyn CommandRunner, distro: Distro) -> GuardResult<bool> {
    let commands = distro.update_commands();
    if commands.is_empty() {
        log_message(LogLevel::Warning, "Unsupported distro, please update manually");
        return Ok(false);
    }

    log_message(LogLevel::Info, &format!("Updating {} system packages", distro));
    for invocation in &commands {
        log::info!(target: "updater", "running {}", invocation);
        let succeeded = match runner.run(invocation) {
            Ok(output) => output.success(),
            Err(e) if !e.is_fatal() => {
                log::error!(target: "updater", "{}", e);
                false
            }
            Err(e) => return Err(e),
        };
        if !succeeded {
            log_message(
                LogLevel::Error,
                &format!("'{}' failed, please update manually", invocation),
            );
            return Ok(false);
        }
    }

    log_message(LogLevel::Pass, "System packages are up to date");
    Ok(true)
}
