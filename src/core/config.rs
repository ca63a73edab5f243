/// Application version - single source of truth
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "HARDN-GUARD";

/// Default locations of the files this tool audits
pub const DEFAULT_SUDOERS_FILE: &str = "/etc/sudoers";
pub const DEFAULT_SSHD_CONFIG: &str = "/etc/ssh/sshd_config";
pub const DEFAULT_OS_RELEASE: &str = "/etc/os-release";

/// Default environment variable values
pub const DEFAULT_CONFIG_FILE: &str = "/etc/hardn/guard.conf";
pub const DEFAULT_LOG_FILE: &str = "/var/log/hardn/guard.log";
pub const DEFAULT_SCRATCH_DIR: &str = "/tmp";

/// Prefix for environment overrides, e.g. HARDN_GUARD_SUDOERS_FILE
pub const ENV_PREFIX: &str = "HARDN_GUARD_";

/// Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Timestamp appended to backup files: <file>.<stamp>.bkp
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";
pub const BACKUP_SUFFIX: &str = "bkp";

/// Accounts and groups that ship with root access on common distributions.
/// These are never removed automatically.
pub const DEFAULT_PROTECTED_NAMES: &[&str] = &["root", "sudo", "wheel", "admin"];

/// External tools
pub const SUDO_BIN: &str = "sudo";
pub const COPY_BIN: &str = "cp";
pub const CAT_BIN: &str = "cat";
pub const VISUDO_BIN: &str = "visudo";
pub const GETENT_BIN: &str = "getent";
pub const GPASSWD_BIN: &str = "gpasswd";
pub const SYSTEMCTL_BIN: &str = "systemctl";
pub const SSHD_BIN: &str = "sshd";
pub const APT_BIN: &str = "apt-get";
pub const DNF_BIN: &str = "dnf";

/// systemd unit files used to work out what the SSH server is called
pub const SSHD_UNIT_CANDIDATES: &[(&str, &str)] = &[
    ("/usr/lib/systemd/system/sshd.service", "sshd"),
    ("/usr/lib/systemd/system/ssh.service", "ssh"),
];
