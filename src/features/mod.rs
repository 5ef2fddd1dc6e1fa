//! # Features Layer
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod notifications;
pub mod reminders;

pub use notifications::{
    Capability, CapabilityRequester, DeliveryError, LogChannel, Notification, NotificationChannel,
    PermissionGate, WebhookChannel,
};
pub use reminders::{
    Reminder, ReminderScheduler, ReminderService, SchedulerConfig, SchedulerHandle, TickReport,
    TriggerEvaluator,
};
