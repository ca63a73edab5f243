pub mod logging;
pub mod paths;
pub mod system;

// Re-export commonly used functions
pub use logging::{log_message, LogLevel};
pub use paths::{backup_glob, backup_path, scratch_path};
pub use system::{current_user, is_root};
