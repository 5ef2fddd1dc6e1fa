// Core layer - configuration and time source
pub mod core;

// Features layer - reminders and notification delivery
pub mod features;

// Persistence
pub mod database;

pub use crate::core::{Clock, Config, ManualClock, SystemClock};

pub use database::{
    DispatchDay, DispatchRecord, InMemoryReminderStore, ReminderStore, SqliteReminderStore,
};

pub use features::{
    // Notifications
    Capability, CapabilityRequester, DeliveryError, LogChannel, Notification, NotificationChannel,
    PermissionGate, WebhookChannel,
    // Reminders
    Reminder, ReminderScheduler, ReminderService, SchedulerConfig, SchedulerHandle, TickReport,
    TriggerEvaluator,
};
