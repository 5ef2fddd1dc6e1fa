//! # Reminder Service
//!
//! Owner-scoped management of reminders on top of any [`ReminderStore`].
//! Every write is validated here so the store only ever receives
//! well-formed schedules.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;

use super::model::{
    normalize_days_of_week, NewReminder, Reminder, ReminderFilter, ReminderKind, ReminderPatch,
    TimeOfDay,
};
use crate::database::ReminderStore;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid reminder: {0}")]
    Validation(String),

    #[error("reminder not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Clone)]
pub struct ReminderService {
    store: Arc<dyn ReminderStore>,
}

impl ReminderService {
    pub fn new(store: Arc<dyn ReminderStore>) -> Self {
        ReminderService { store }
    }

    pub async fn create(&self, owner_id: &str, mut new: NewReminder) -> ServiceResult<Reminder> {
        new.title = validate_title(&new.title)?;
        validate_time_of_day(&new.time_of_day)?;
        new.days_of_week = normalize_days_of_week(&new.days_of_week).map_err(ServiceError::Validation)?;
        new.message = new.message.filter(|m| !m.trim().is_empty());

        let reminder = self.store.create(owner_id, new).await?;
        info!(
            "Created {} reminder {} for {} at {} ({})",
            reminder.kind, reminder.id, owner_id, reminder.time_of_day, reminder.frequency
        );
        Ok(reminder)
    }

    pub async fn get(&self, owner_id: &str, id: &str) -> ServiceResult<Reminder> {
        self.owned(owner_id, id).await
    }

    /// The owner's reminders, enabled first, then by time of day
    pub async fn list(
        &self,
        owner_id: &str,
        kind: Option<ReminderKind>,
        enabled: Option<bool>,
    ) -> ServiceResult<Vec<Reminder>> {
        let filter = ReminderFilter {
            owner_id: Some(owner_id.to_string()),
            kind,
            enabled,
        };
        Ok(self.store.list(&filter).await?)
    }

    /// Apply the fields present in `patch`
    pub async fn update(
        &self,
        owner_id: &str,
        id: &str,
        patch: ReminderPatch,
    ) -> ServiceResult<Reminder> {
        let mut reminder = self.owned(owner_id, id).await?;

        if let Some(kind) = patch.kind {
            reminder.kind = kind;
        }
        if let Some(title) = patch.title {
            reminder.title = validate_title(&title)?;
        }
        if let Some(message) = patch.message {
            reminder.message = Some(message).filter(|m| !m.trim().is_empty());
        }
        if let Some(time) = patch.time_of_day {
            validate_time_of_day(&time)?;
            reminder.time_of_day = time;
        }
        if let Some(frequency) = patch.frequency {
            reminder.frequency = frequency;
        }
        if let Some(days) = patch.days_of_week {
            reminder.days_of_week = normalize_days_of_week(&days).map_err(ServiceError::Validation)?;
        }
        if let Some(enabled) = patch.enabled {
            reminder.enabled = enabled;
        }
        reminder.updated_at = Utc::now();

        if !self.store.update(&reminder).await? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        debug!("Updated reminder {id}");

        // Re-read so the returned copy carries the store's dispatch timestamp
        self.owned(owner_id, id).await
    }

    pub async fn set_enabled(&self, owner_id: &str, id: &str, enabled: bool) -> ServiceResult<Reminder> {
        self.update(
            owner_id,
            id,
            ReminderPatch {
                enabled: Some(enabled),
                ..ReminderPatch::default()
            },
        )
        .await
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> ServiceResult<()> {
        self.owned(owner_id, id).await?;
        if !self.store.delete(id).await? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        info!("Deleted reminder {id} for {owner_id}");
        Ok(())
    }

    /// Fetch a reminder, treating another owner's reminder as missing
    async fn owned(&self, owner_id: &str, id: &str) -> ServiceResult<Reminder> {
        match self.store.get(id).await? {
            Some(reminder) if reminder.owner_id == owner_id => Ok(reminder),
            _ => Err(ServiceError::NotFound(id.to_string())),
        }
    }
}

fn validate_title(title: &str) -> ServiceResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation("title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_time_of_day(value: &str) -> ServiceResult<()> {
    match TimeOfDay::parse(value) {
        Some(_) => Ok(()),
        None => Err(ServiceError::Validation(format!(
            "time of day must be HH:mm, got {value:?}"
        ))),
    }
}
