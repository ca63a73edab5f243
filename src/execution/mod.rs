pub mod runner;
pub mod staging;

pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
pub use staging::{backup_file, install_validated, read_protected, BackupOutcome, InstallOutcome};
