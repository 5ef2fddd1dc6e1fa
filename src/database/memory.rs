//! In-memory reminder store
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! DashMap-backed, so per-reminder updates are atomic under the entry lock.
//! Suited to tests and single-process embeddings that do not need durability.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{dispatch_slot_open, sort_for_listing, DispatchDay, DispatchRecord, ReminderStore};
use crate::features::reminders::model::{NewReminder, Reminder, ReminderFilter};

#[derive(Debug, Default)]
pub struct InMemoryReminderStore {
    reminders: DashMap<String, Reminder>,
}

impl InMemoryReminderStore {
    pub fn new() -> Self {
        InMemoryReminderStore {
            reminders: DashMap::new(),
        }
    }

    /// Insert a fully formed reminder as-is, bypassing validation
    pub fn insert(&self, reminder: Reminder) {
        self.reminders.insert(reminder.id.clone(), reminder);
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }
}

#[async_trait]
impl ReminderStore for InMemoryReminderStore {
    async fn update_last_dispatched(&self, id: &str, day: DispatchDay) -> Result<DispatchRecord> {
        let Some(mut entry) = self.reminders.get_mut(id) else {
            return Ok(DispatchRecord::Missing);
        };
        if !dispatch_slot_open(entry.last_dispatched_at.as_ref(), &day) {
            return Ok(DispatchRecord::AlreadyRecorded);
        }
        entry.last_dispatched_at = Some(day.at);
        Ok(DispatchRecord::Recorded)
    }

    async fn create(&self, owner_id: &str, new: NewReminder) -> Result<Reminder> {
        let reminder = Reminder::from_new(Uuid::new_v4().to_string(), owner_id, new, Utc::now());
        self.reminders.insert(reminder.id.clone(), reminder.clone());
        Ok(reminder)
    }

    async fn get(&self, id: &str) -> Result<Option<Reminder>> {
        Ok(self.reminders.get(id).map(|r| r.value().clone()))
    }

    async fn list(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>> {
        let mut matching: Vec<Reminder> = self
            .reminders
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        sort_for_listing(&mut matching);
        Ok(matching)
    }

    async fn update(&self, reminder: &Reminder) -> Result<bool> {
        let Some(mut entry) = self.reminders.get_mut(&reminder.id) else {
            return Ok(false);
        };
        let stored = entry.value_mut();
        stored.kind = reminder.kind;
        stored.title = reminder.title.clone();
        stored.message = reminder.message.clone();
        stored.time_of_day = reminder.time_of_day.clone();
        stored.frequency = reminder.frequency;
        stored.days_of_week = reminder.days_of_week.clone();
        stored.enabled = reminder.enabled;
        stored.updated_at = reminder.updated_at;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.reminders.remove(id).is_some())
    }
}
