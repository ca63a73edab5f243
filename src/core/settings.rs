use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{
    DEFAULT_CONFIG_FILE, DEFAULT_LOG_FILE, DEFAULT_PROTECTED_NAMES, DEFAULT_SCRATCH_DIR,
    DEFAULT_SSHD_CONFIG, DEFAULT_SUDOERS_FILE, ENV_PREFIX,
};
use crate::core::{GuardError, GuardResult};

/// Runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config_file: PathBuf,
    pub sudoers_file: PathBuf,
    pub sshd_config: PathBuf,
    pub scratch_dir: PathBuf,
    pub log_file: PathBuf,
    pub protected_names: Vec<String>,
    /// Prefix privileged commands with sudo when not already root
    pub use_sudo: bool,
    pub color: bool,
}

impl Settings {
    /// Load settings from the config file, then apply environment overrides
    pub fn load(config_override: Option<&Path>) -> GuardResult<Self> {
        let config_file = match config_override {
            Some(path) => path.to_path_buf(),
            None => env::var(format!("{}CONFIG", ENV_PREFIX))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        };

        let mut settings = Self {
            config_file: config_file.clone(),
            ..Self::default()
        };

        if config_file.exists() {
            settings.load_from_file(&config_file)?;
        }

        settings.load_from_env(|key| env::var(format!("{}{}", ENV_PREFIX, key)).ok())?;

        Ok(settings)
    }

    fn load_from_file(&mut self, path: &Path) -> GuardResult<()> {
        match fs::read_to_string(path) {
            Ok(content) => self.apply_config_text(&content),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                // Readable only by root; stay on defaults
                log::warn!("cannot read {}: {}", path.display(), e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn apply_config_text(&mut self, content: &str) -> GuardResult<()> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');
                self.apply(key, value)?;
            }
        }
        Ok(())
    }

    fn load_from_env<F>(&mut self, lookup: F) -> GuardResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in KEYS {
            if let Some(value) = lookup(key) {
                self.apply(key, value.trim())?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> GuardResult<()> {
        match key {
            "SUDOERS_FILE" => self.sudoers_file = PathBuf::from(value),
            "SSHD_CONFIG" => self.sshd_config = PathBuf::from(value),
            "SCRATCH_DIR" => self.scratch_dir = PathBuf::from(value),
            "LOG_FILE" => self.log_file = PathBuf::from(value),
            "PROTECTED_NAMES" => self.protected_names = parse_name_list(value),
            "USE_SUDO" => self.use_sudo = parse_bool(key, value)?,
            "COLOR" => self.color = parse_bool(key, value)?,
            _ => {} // Ignore unknown keys
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            sudoers_file: PathBuf::from(DEFAULT_SUDOERS_FILE),
            sshd_config: PathBuf::from(DEFAULT_SSHD_CONFIG),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            protected_names: DEFAULT_PROTECTED_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            use_sudo: true,
            color: true,
        }
    }
}

const KEYS: &[&str] = &[
    "SUDOERS_FILE",
    "SSHD_CONFIG",
    "SCRATCH_DIR",
    "LOG_FILE",
    "PROTECTED_NAMES",
    "USE_SUDO",
    "COLOR",
];

fn parse_name_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> GuardResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => Err(GuardError::Config(format!(
            "{} expects a boolean, got '{}'",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_protect_distribution_admins() {
        let settings = Settings::default();
        for name in ["root", "sudo", "wheel", "admin"] {
            assert!(
                settings.protected_names.iter().any(|n| n == name),
                "{} should be protected",
                name
            );
        }
        assert!(!settings.protected_names.contains(&"devops".to_string()));
        assert_eq!(settings.sudoers_file, PathBuf::from("/etc/sudoers"));
    }

    #[test]
    fn config_text_overrides_defaults() {
        let mut settings = Settings::default();
        settings
            .apply_config_text(
                "# guard settings\n\
                 SUDOERS_FILE=\"/srv/sudoers\"\n\
                 \n\
                 PROTECTED_NAMES = root, wheel ,\n\
                 USE_SUDO=no\n\
                 UNKNOWN_KEY=whatever\n",
            )
            .expect("config should parse");

        assert_eq!(settings.sudoers_file, PathBuf::from("/srv/sudoers"));
        assert_eq!(settings.protected_names, vec!["root", "wheel"]);
        assert!(!settings.use_sudo);
    }

    #[test]
    fn bad_boolean_is_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_config_text("COLOR=sometimes\n")
            .expect_err("should reject non-boolean");
        assert!(err.to_string().contains("COLOR"));
    }

    #[test]
    fn environment_wins_over_file() {
        let mut settings = Settings::default();
        settings
            .apply_config_text("SCRATCH_DIR=/var/tmp\n")
            .expect("config should parse");

        let env: HashMap<&str, &str> = [("SCRATCH_DIR", "/run/guard")].into_iter().collect();
        settings
            .load_from_env(|key| env.get(key).map(|v| v.to_string()))
            .expect("env should apply");

        assert_eq!(settings.scratch_dir, PathBuf::from("/run/guard"));
    }

    #[test]
    fn load_reads_explicit_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "SSHD_CONFIG=/opt/ssh/sshd_config").expect("write config");

        let settings = Settings::load(Some(file.path())).expect("settings should load");
        assert_eq!(settings.config_file, file.path());
        assert_eq!(settings.sshd_config, PathBuf::from("/opt/ssh/sshd_config"));
    }
}
