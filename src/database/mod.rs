//! # Reminder Persistence
//!
//! The store contract the scheduler and service depend on, with an in-memory
//! implementation and a SQLite implementation.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Dispatch claims take a `DispatchDay` resolved with the caller's zone rules
//! - 1.0.0: Store contract, memory and SQLite stores
//!
//! Stores must give read-your-writes: a dispatch recorded in one tick has to
//! be visible to the next tick's fetch, or the same-day dedup cannot work.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::features::reminders::model::{NewReminder, Reminder, ReminderFilter, Scope};

pub use memory::InMemoryReminderStore;
pub use sqlite::SqliteReminderStore;

/// A dispatch instant together with the start of its local calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchDay {
    pub at: DateTime<Utc>,
    pub day_start: DateTime<Utc>,
}

impl DispatchDay {
    /// Resolve the local day of `at` using its zone's rules
    pub fn of<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        DispatchDay {
            at: at.with_timezone(&Utc),
            day_start: local_day_start(at),
        }
    }
}

/// Result of recording a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchRecord {
    /// Timestamp written
    Recorded,
    /// Another agent already recorded a dispatch for this local day
    AlreadyRecorded,
    /// The reminder no longer exists
    Missing,
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Enabled reminders inside `scope`
    async fn list_enabled(&self, scope: &Scope) -> Result<Vec<Reminder>> {
        self.list(&scope.enabled_filter()).await
    }

    /// Record a delivered notification.
    ///
    /// Conditional write: stores `day.at` only while the stored timestamp is
    /// null or earlier than `day.day_start`. Two agents racing on the same
    /// occurrence cannot both record it, and the timestamp never moves backward.
    async fn update_last_dispatched(&self, id: &str, day: DispatchDay) -> Result<DispatchRecord>;

    /// Insert a new reminder; the store assigns the id
    async fn create(&self, owner_id: &str, new: NewReminder) -> Result<Reminder>;

    async fn get(&self, id: &str) -> Result<Option<Reminder>>;

    /// Matching reminders, enabled first, then by time of day
    async fn list(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>>;

    /// Persist owner-editable fields. Never touches `last_dispatched_at`.
    /// Returns false if the reminder does not exist.
    async fn update(&self, reminder: &Reminder) -> Result<bool>;

    /// Returns false if the reminder did not exist
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// First instant of `at`'s local calendar day, as UTC
///
/// Uses the zone's own rules for that date, so the day start keeps its real
/// offset on DST transition days. Where midnight itself is skipped, the
/// first local hour that exists is the start.
pub fn local_day_start<Tz: TimeZone>(at: &DateTime<Tz>) -> DateTime<Utc> {
    let zone = at.timezone();
    let date = at.date_naive();
    (0..24)
        .find_map(|hour| zone.from_local_datetime(&date.and_hms_opt(hour, 0, 0)?).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| at.with_timezone(&Utc))
}

/// Whether a stored dispatch timestamp still allows recording `day`
pub(crate) fn dispatch_slot_open(existing: Option<&DateTime<Utc>>, day: &DispatchDay) -> bool {
    match existing {
        None => true,
        Some(last) => *last < day.day_start,
    }
}

/// Sort order shared by every store
pub(crate) fn sort_for_listing(reminders: &mut [Reminder]) {
    reminders.sort_by(|a, b| {
        b.enabled
            .cmp(&a.enabled)
            .then_with(|| a.time_of_day.cmp(&b.time_of_day))
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
