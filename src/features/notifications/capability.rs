//! Delivery capability states
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Permission state of a delivery channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// User allowed notifications
    Granted,
    /// User refused notifications
    Denied,
    /// User has not been asked yet
    Default,
    /// Channel cannot deliver at all
    Unsupported,
}

impl Capability {
    pub fn is_granted(&self) -> bool {
        matches!(self, Capability::Granted)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Granted => write!(f, "granted"),
            Capability::Denied => write!(f, "denied"),
            Capability::Default => write!(f, "default"),
            Capability::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl std::str::FromStr for Capability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "granted" => Ok(Capability::Granted),
            "denied" => Ok(Capability::Denied),
            "default" => Ok(Capability::Default),
            "unsupported" => Ok(Capability::Unsupported),
            _ => Err(anyhow::anyhow!("Invalid notification capability: {}", s)),
        }
    }
}

/// Answer to an explicit permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestOutcome {
    Granted,
    Denied,
}

impl From<RequestOutcome> for Capability {
    fn from(outcome: RequestOutcome) -> Self {
        match outcome {
            RequestOutcome::Granted => Capability::Granted,
            RequestOutcome::Denied => Capability::Denied,
        }
    }
}
