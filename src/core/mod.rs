pub mod config;
pub mod error;
pub mod settings;
pub mod types;

// Re-export commonly used items at module level
pub use error::{GuardError, GuardResult};
pub use settings::Settings;
pub use types::{Recommendation, ServiceStatus, Urgency};
