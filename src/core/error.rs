use std::error::Error;
use std::fmt;
use std::io;

/// Error type shared by every audit stage
#[derive(Debug)]
pub enum GuardError {
    /// An external tool could not be spawned or exited unsuccessfully
    ExecutionFailed(String),
    /// A line of a configuration file could not be understood
    Format { line: usize, message: String },
    /// A staged file was rejected by its syntax checker
    Validation(String),
    /// Operator input closed before a question was answered
    Input(String),
    /// A setting had an unusable value
    Config(String),
    IoError(io::Error),
}

impl GuardError {
    pub fn format<S: Into<String>>(line: usize, message: S) -> Self {
        GuardError::Format {
            line,
            message: message.into(),
        }
    }

    /// Whether the run must stop before anything else is attempted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GuardError::IoError(_) | GuardError::Format { .. } | GuardError::Input(_)
        )
    }
}

impl fmt::Display for GuardError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GuardError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            GuardError::Format { line, message } => {
                write!(f, "Format error on line {}: {}", line, message)
            }
            GuardError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            GuardError::Input(msg) => write!(f, "Input error: {}", msg),
            GuardError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GuardError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for GuardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GuardError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for GuardError {
    fn from(err: io::Error) -> Self {
        GuardError::IoError(err)
    }
}

/// Result type alias for cleaner code
pub type GuardResult<T> = Result<T, GuardError>;
