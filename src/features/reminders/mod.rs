//! # Reminders Feature
//!
//! Recurring health reminders: schedule model, trigger evaluation,
//! notification text, owner-scoped management and the dispatch loop.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod evaluator;
pub mod message;
pub mod model;
pub mod scheduler;
pub mod service;

pub use evaluator::{is_due, TriggerEvaluator, Verdict, DEFAULT_MATCH_TOLERANCE_MINUTES};
pub use message::{build_notification, dedup_tag, default_message, format_reminder_message};
pub use model::{
    Frequency, NewReminder, Reminder, ReminderFilter, ReminderKind, ReminderPatch, Scope,
    TimeOfDay,
};
pub use scheduler::{
    ReminderScheduler, SchedulerConfig, SchedulerHandle, TickReport, DEFAULT_TICK_INTERVAL,
};
pub use service::{ReminderService, ServiceError, ServiceResult};
