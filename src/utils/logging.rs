use atty::Stream;
use chrono::Local;
use once_cell::sync::Lazy;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

static COLOR_ENABLED: Lazy<AtomicBool> = Lazy::new(|| {
    let enabled = atty::is(Stream::Stdout) && std::env::var_os("NO_COLOR").is_none();
    AtomicBool::new(enabled)
});

const RESET: &str = "\x1b[0m";

/// Log levels for colored console output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Pass,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn color_code(&self) -> &'static str {
        match self {
            Self::Pass => "\x1b[1;32m",    // Green
            Self::Info => "\x1b[1;34m",    // Blue
            Self::Warning => "\x1b[1;33m", // Yellow
            Self::Error => "\x1b[1;31m",   // Red
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Pass => "[PASS]",
            Self::Info => "[INFO]",
            Self::Warning => "[WARNING]",
            Self::Error => "[ERROR]",
        }
    }

    fn record_level(&self) -> log::Level {
        match self {
            Self::Pass | Self::Info => log::Level::Info,
            Self::Warning => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if color_enabled() {
            write!(f, "{}{}{}", self.color_code(), self.prefix(), RESET)
        } else {
            write!(f, "{}", self.prefix())
        }
    }
}

pub fn enable_color(enable: bool) {
    COLOR_ENABLED.store(enable, Ordering::Relaxed);
}

pub fn color_enabled() -> bool {
    COLOR_ENABLED.load(Ordering::Relaxed)
}

/// Keeps stdout free for machine-readable output (`--json`)
static CONSOLE_TO_STDERR: AtomicBool = AtomicBool::new(false);

pub fn route_console_to_stderr(enable: bool) {
    CONSOLE_TO_STDERR.store(enable, Ordering::Relaxed);
}

pub fn console_uses_stderr() -> bool {
    CONSOLE_TO_STDERR.load(Ordering::Relaxed)
}

/// Print a line meant for the operator on the console stream
pub fn console_line(text: &str) {
    if console_uses_stderr() {
        eprintln!("{}", text);
    } else {
        println!("{}", text);
    }
}

/// Print an operator-facing status line and mirror it to the diagnostic log
pub fn log_message(level: LogLevel, message: &str) {
    console_line(&format!("{} {}", level, message));
    log::log!(target: "console", level.record_level(), "{}", message);
}

/// Appends timestamped diagnostic records to the HARDN log file
pub struct FileLogger {
    level: log::LevelFilter,
    file: Mutex<File>,
}

impl FileLogger {
    pub fn open(path: &Path, level: log::LevelFilter) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            level,
            file: Mutex::new(file),
        })
    }
}

fn format_record(record: &log::Record) -> String {
    format!(
        "{} {:<5} [{}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.target(),
        record.args()
    )
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", format_record(record));
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

/// Install the file logger. Diagnostics are dropped when the log file
/// cannot be opened (e.g. running unprivileged).
pub fn init_diagnostics(path: &Path, verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    match FileLogger::open(path, level) {
        Ok(logger) => {
            if log::set_boxed_logger(Box::new(logger)).is_ok() {
                log::set_max_level(level);
            }
        }
        Err(e) => {
            if verbose {
                eprintln!("Warning: diagnostics disabled, cannot open {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn console_can_be_moved_off_stdout() {
        assert!(!console_uses_stderr());
        route_console_to_stderr(true);
        assert!(console_uses_stderr());
        log_message(LogLevel::Info, "written to stderr");
        route_console_to_stderr(false);
        assert!(!console_uses_stderr());
    }

    #[test]
    fn prefixes_match_levels() {
        assert_eq!(LogLevel::Pass.prefix(), "[PASS]");
        assert_eq!(LogLevel::Warning.prefix(), "[WARNING]");
        assert_eq!(LogLevel::Error.record_level(), log::Level::Error);
    }

    #[test]
    fn file_logger_appends_records_at_or_above_level() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("guard.log");
        let logger = FileLogger::open(&path, log::LevelFilter::Info).expect("logger opens");

        logger.log(
            &log::Record::builder()
                .level(log::Level::Info)
                .target("sudoers")
                .args(format_args!("entry removed"))
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .target("sudoers")
                .args(format_args!("hidden"))
                .build(),
        );
        logger.flush();

        let content = fs::read_to_string(&path).expect("log written");
        assert!(content.contains("INFO  [sudoers] entry removed"));
        assert!(!content.contains("hidden"));
    }
}
