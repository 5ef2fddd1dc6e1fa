//! Environment-driven configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Database, logging, scheduler cadence and notification settings

use anyhow::{anyhow, Result};
use std::time::Duration;

use crate::features::notifications::Capability;
use crate::features::reminders::{SchedulerConfig, Scope, DEFAULT_MATCH_TOLERANCE_MINUTES};

const DEFAULT_DATABASE_PATH: &str = "healthtrack.db";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TICK_SECONDS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub log_level: String,
    /// Seconds between scheduler ticks
    pub tick_interval_secs: u64,
    /// Allowed distance in minutes between "now" and a reminder's time of day
    pub match_tolerance_minutes: u32,
    /// Restrict the scheduler to one owner's reminders; `None` means all owners
    pub owner_id: Option<String>,
    /// Deliver notifications to this URL instead of the log
    pub webhook_url: Option<String>,
    /// Capability state the notification gate starts in
    pub notify_permission: Capability,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (env vars in production, maps in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let tick_interval_secs = match non_empty("REMINDER_TICK_SECONDS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| anyhow!("REMINDER_TICK_SECONDS must be a whole number of seconds: {e}"))?,
            None => DEFAULT_TICK_SECONDS,
        };
        if tick_interval_secs == 0 {
            return Err(anyhow!("REMINDER_TICK_SECONDS must be greater than zero"));
        }

        let match_tolerance_minutes = match non_empty("REMINDER_MATCH_TOLERANCE_MINUTES") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                anyhow!("REMINDER_MATCH_TOLERANCE_MINUTES must be a whole number of minutes: {e}")
            })?,
            None => DEFAULT_MATCH_TOLERANCE_MINUTES,
        };
        if match_tolerance_minutes > 59 {
            return Err(anyhow!(
                "REMINDER_MATCH_TOLERANCE_MINUTES must be between 0 and 59, got {match_tolerance_minutes}"
            ));
        }

        let notify_permission = match non_empty("NOTIFY_PERMISSION") {
            Some(raw) => raw.parse::<Capability>()?,
            None => Capability::Granted,
        };

        Ok(Config {
            database_path: non_empty("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            tick_interval_secs,
            match_tolerance_minutes,
            owner_id: non_empty("REMINDER_OWNER_ID"),
            webhook_url: non_empty("NOTIFY_WEBHOOK_URL"),
            notify_permission,
        })
    }

    /// Scheduler settings derived from this config
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_secs(self.tick_interval_secs),
            match_tolerance_minutes: self.match_tolerance_minutes,
            scope: match &self.owner_id {
                Some(owner) => Scope::Owner(owner.clone()),
                None => Scope::All,
            },
        }
    }
}
