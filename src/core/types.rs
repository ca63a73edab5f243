use serde::Serialize;
use std::fmt;

/// Service status information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceStatus {
    pub name: String,
    pub active: bool,
    pub enabled: bool,
}

impl ServiceStatus {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn running_or_enabled(&self) -> bool {
        self.active || self.enabled
    }
}

/// How urgent a follow-up is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Advisory,
    Dangerous,
}

/// Manual follow-up the operator has to perform after the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub urgency: Urgency,
    pub message: String,
}

impl Recommendation {
    pub fn advisory(message: impl Into<String>) -> Self {
        Self {
            urgency: Urgency::Advisory,
            message: message.into(),
        }
    }

    /// Rendered with a DANGEROUS! prefix
    pub fn dangerous(message: impl Into<String>) -> Self {
        Self {
            urgency: Urgency::Dangerous,
            message: message.into(),
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.urgency {
            Urgency::Advisory => write!(f, "{}", self.message),
            Urgency::Dangerous => write!(f, "DANGEROUS! {}", self.message),
        }
    }
}
