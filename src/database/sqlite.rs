//! # SQLite Reminder Store
//!
//! Durable store backed by a single SQLite file.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! Timestamps are stored as fixed-width UTC text so string comparison in SQL
//! orders them chronologically. Weekday lists are stored as JSON arrays.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use log::{info, warn};
use sqlite::{Connection, State, Statement};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{DispatchDay, DispatchRecord, ReminderStore};
use crate::features::reminders::model::{days_from_json, NewReminder, Reminder, ReminderFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS reminders (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT,
    time_of_day TEXT NOT NULL,
    frequency TEXT NOT NULL,
    days_of_week TEXT NOT NULL DEFAULT '[]',
    enabled INTEGER NOT NULL DEFAULT 1,
    last_dispatched_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reminders_owner ON reminders(owner_id);
CREATE INDEX IF NOT EXISTS idx_reminders_enabled ON reminders(enabled, time_of_day);
";

const SELECT_COLUMNS: &str = "id, owner_id, kind, title, message, time_of_day, frequency, \
     days_of_week, enabled, last_dispatched_at, created_at, updated_at";

pub struct SqliteReminderStore {
    connection: Mutex<Connection>,
}

impl SqliteReminderStore {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection = sqlite::open(path)
            .with_context(|| format!("Failed to open reminder database {}", path.display()))?;
        connection
            .execute(SCHEMA)
            .context("Failed to initialize reminder schema")?;
        info!("Reminder database ready at {}", path.display());
        Ok(SqliteReminderStore {
            connection: Mutex::new(connection),
        })
    }

    /// Private database that disappears when the store is dropped
    pub fn open_in_memory() -> Result<Self> {
        let connection = sqlite::open(":memory:")?;
        connection.execute(SCHEMA)?;
        Ok(SqliteReminderStore {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record_dispatch(&self, id: &str, day: &DispatchDay) -> Result<DispatchRecord> {
        let conn = self.lock();
        let stamp = format_timestamp(&day.at);
        let day_start = format_timestamp(&day.day_start);

        let mut stmt = conn.prepare(
            "UPDATE reminders SET last_dispatched_at = ?1
             WHERE id = ?2 AND (last_dispatched_at IS NULL OR last_dispatched_at < ?3)",
        )?;
        stmt.bind((1, stamp.as_str()))?;
        stmt.bind((2, id))?;
        stmt.bind((3, day_start.as_str()))?;
        while stmt.next()? != State::Done {}
        drop(stmt);

        if conn.change_count() > 0 {
            return Ok(DispatchRecord::Recorded);
        }

        let mut exists = conn.prepare("SELECT COUNT(*) AS n FROM reminders WHERE id = ?1")?;
        exists.bind((1, id))?;
        let found = match exists.next()? {
            State::Row => exists.read::<i64, _>("n")? > 0,
            State::Done => false,
        };
        Ok(if found {
            DispatchRecord::AlreadyRecorded
        } else {
            DispatchRecord::Missing
        })
    }

    fn insert(&self, reminder: &Reminder) -> Result<()> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "INSERT INTO reminders (id, owner_id, kind, title, message, time_of_day, frequency,
                days_of_week, enabled, last_dispatched_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        let kind = reminder.kind.to_string();
        let frequency = reminder.frequency.to_string();
        let days = serde_json::to_string(&reminder.days_of_week)?;
        let last = reminder.last_dispatched_at.as_ref().map(format_timestamp);
        let created = format_timestamp(&reminder.created_at);
        let updated = format_timestamp(&reminder.updated_at);

        stmt.bind((1, reminder.id.as_str()))?;
        stmt.bind((2, reminder.owner_id.as_str()))?;
        stmt.bind((3, kind.as_str()))?;
        stmt.bind((4, reminder.title.as_str()))?;
        stmt.bind((5, reminder.message.as_deref()))?;
        stmt.bind((6, reminder.time_of_day.as_str()))?;
        stmt.bind((7, frequency.as_str()))?;
        stmt.bind((8, days.as_str()))?;
        stmt.bind((9, i64::from(reminder.enabled)))?;
        stmt.bind((10, last.as_deref()))?;
        stmt.bind((11, created.as_str()))?;
        stmt.bind((12, updated.as_str()))?;
        while stmt.next()? != State::Done {}
        Ok(())
    }

    fn select(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM reminders
             WHERE (?1 IS NULL OR owner_id = ?1)
               AND (?2 IS NULL OR kind = ?2)
               AND (?3 IS NULL OR enabled = ?3)
             ORDER BY enabled DESC, time_of_day ASC, created_at ASC, id ASC"
        );
        let mut stmt = conn.prepare(sql)?;
        let kind = filter.kind.map(|k| k.to_string());
        stmt.bind((1, filter.owner_id.as_deref()))?;
        stmt.bind((2, kind.as_deref()))?;
        stmt.bind((3, filter.enabled.map(i64::from)))?;

        let mut reminders = Vec::new();
        while let State::Row = stmt.next()? {
            match read_reminder(&stmt) {
                Ok(reminder) => reminders.push(reminder),
                Err(e) => {
                    let id = stmt.read::<String, _>("id").unwrap_or_default();
                    warn!("Skipping unreadable reminder row {id:?}: {e:#}");
                }
            }
        }
        Ok(reminders)
    }

    fn select_one(&self, id: &str) -> Result<Option<Reminder>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(format!("SELECT {SELECT_COLUMNS} FROM reminders WHERE id = ?1"))?;
        stmt.bind((1, id))?;
        match stmt.next()? {
            State::Row => Ok(Some(read_reminder(&stmt)?)),
            State::Done => Ok(None),
        }
    }

    fn write_fields(&self, reminder: &Reminder) -> Result<bool> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "UPDATE reminders SET kind = ?1, title = ?2, message = ?3, time_of_day = ?4,
                frequency = ?5, days_of_week = ?6, enabled = ?7, updated_at = ?8
             WHERE id = ?9",
        )?;
        let kind = reminder.kind.to_string();
        let frequency = reminder.frequency.to_string();
        let days = serde_json::to_string(&reminder.days_of_week)?;
        let updated = format_timestamp(&reminder.updated_at);

        stmt.bind((1, kind.as_str()))?;
        stmt.bind((2, reminder.title.as_str()))?;
        stmt.bind((3, reminder.message.as_deref()))?;
        stmt.bind((4, reminder.time_of_day.as_str()))?;
        stmt.bind((5, frequency.as_str()))?;
        stmt.bind((6, days.as_str()))?;
        stmt.bind((7, i64::from(reminder.enabled)))?;
        stmt.bind((8, updated.as_str()))?;
        stmt.bind((9, reminder.id.as_str()))?;
        while stmt.next()? != State::Done {}
        drop(stmt);
        Ok(conn.change_count() > 0)
    }

    fn remove(&self, id: &str) -> Result<bool> {
        let conn = self.lock();
        let mut stmt = conn.prepare("DELETE FROM reminders WHERE id = ?1")?;
        stmt.bind((1, id))?;
        while stmt.next()? != State::Done {}
        drop(stmt);
        Ok(conn.change_count() > 0)
    }
}

#[async_trait]
impl ReminderStore for SqliteReminderStore {
    async fn update_last_dispatched(&self, id: &str, day: DispatchDay) -> Result<DispatchRecord> {
        self.record_dispatch(id, &day)
    }

    async fn create(&self, owner_id: &str, new: NewReminder) -> Result<Reminder> {
        // Stored with microsecond precision
        let now = Utc::now().trunc_subsecs(6);
        let reminder = Reminder::from_new(Uuid::new_v4().to_string(), owner_id, new, now);
        self.insert(&reminder)?;
        Ok(reminder)
    }

    async fn get(&self, id: &str) -> Result<Option<Reminder>> {
        self.select_one(id)
    }

    async fn list(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>> {
        self.select(filter)
    }

    async fn update(&self, reminder: &Reminder) -> Result<bool> {
        self.write_fields(reminder)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.remove(id)
    }
}

fn read_reminder(stmt: &Statement<'_>) -> Result<Reminder> {
    let id = stmt.read::<String, _>("id")?;
    let kind = stmt.read::<String, _>("kind")?;
    let frequency = stmt.read::<String, _>("frequency")?;
    let days = stmt.read::<String, _>("days_of_week")?;
    let last = stmt.read::<Option<String>, _>("last_dispatched_at")?;

    Ok(Reminder {
        owner_id: stmt.read::<String, _>("owner_id")?,
        kind: kind.parse()?,
        title: stmt.read::<String, _>("title")?,
        message: stmt.read::<Option<String>, _>("message")?,
        time_of_day: stmt.read::<String, _>("time_of_day")?,
        frequency: frequency.parse()?,
        days_of_week: days_from_json(&days)
            .with_context(|| format!("invalid days_of_week {days:?}"))?,
        enabled: stmt.read::<i64, _>("enabled")? != 0,
        last_dispatched_at: last.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&stmt.read::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(&stmt.read::<String, _>("updated_at")?)?,
        id,
    })
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .with_context(|| format!("invalid timestamp {text:?}"))?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}
