//! Channel traits and the log-backed channel
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::capability::{Capability, RequestOutcome};

/// A notification ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Dedup tag; sinks that support replacement collapse notifications sharing a tag
    pub tag: String,
    /// Keep the notification on screen until the user dismisses it
    pub require_interaction: bool,
}

/// Why a delivery did not happen
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("notification capability not granted (state: {0})")]
    NotGranted(Capability),

    #[error("notification channel unsupported")]
    Unsupported,

    #[error("transient delivery failure: {0}")]
    Transient(String),
}

/// Best-effort delivery sink
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &str;

    fn capability_state(&self) -> Capability;

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// Explicit, user-triggered permission request
///
/// Never called by the scheduler: prompts are only shown in response to a
/// direct user action.
#[async_trait]
pub trait CapabilityRequester: Send + Sync {
    async fn request_capability(&self) -> RequestOutcome;
}

/// The user-facing side of a permission request
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    async fn ask(&self) -> RequestOutcome;
}

/// Prompt with a fixed answer, for headless deployments and tests
#[derive(Debug, Clone, Copy)]
pub struct StaticPrompt(pub RequestOutcome);

#[async_trait]
impl PermissionPrompt for StaticPrompt {
    async fn ask(&self) -> RequestOutcome {
        self.0
    }
}

/// Writes notifications to the application log
#[derive(Debug, Clone, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        LogChannel
    }
}

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    fn capability_state(&self) -> Capability {
        Capability::Granted
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        info!(
            "🔔 [{}] {}: {}",
            notification.tag, notification.title, notification.body
        );
        Ok(())
    }
}
