//! # Notifications Feature
//!
//! Capability-gated delivery sinks for reminder notifications.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! Delivery (`NotificationChannel`) and permission prompting
//! (`CapabilityRequester`) are separate traits. The scheduler only ever holds
//! the former; prompting is left to direct user action.

pub mod capability;
pub mod channel;
pub mod gate;
pub mod webhook;

pub use capability::{Capability, RequestOutcome};
pub use channel::{
    CapabilityRequester, DeliveryError, LogChannel, Notification, NotificationChannel,
    PermissionPrompt, StaticPrompt,
};
pub use gate::PermissionGate;
pub use webhook::WebhookChannel;
