//! # Reminder Model
//!
//! The schedulable unit plus the input shapes used to create and edit it.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

/// What a reminder is about; only changes the default message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Weight,
    Workout,
    Food,
    Water,
    Sleep,
    Other,
}

impl std::fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderKind::Weight => write!(f, "weight"),
            ReminderKind::Workout => write!(f, "workout"),
            ReminderKind::Food => write!(f, "food"),
            ReminderKind::Water => write!(f, "water"),
            ReminderKind::Sleep => write!(f, "sleep"),
            ReminderKind::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for ReminderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "weight" => Ok(ReminderKind::Weight),
            "workout" => Ok(ReminderKind::Workout),
            "food" => Ok(ReminderKind::Food),
            "water" => Ok(ReminderKind::Water),
            "sleep" => Ok(ReminderKind::Sleep),
            "other" => Ok(ReminderKind::Other),
            _ => Err(anyhow::anyhow!("Invalid reminder kind: {}", s)),
        }
    }
}

/// How often a reminder repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day
    Daily,
    /// Monday through Friday
    Weekdays,
    /// Saturday and Sunday
    Weekends,
    /// Only on the days listed in `days_of_week`
    Weekly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekdays => write!(f, "weekdays"),
            Frequency::Weekends => write!(f, "weekends"),
            Frequency::Weekly => write!(f, "weekly"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekdays" => Ok(Frequency::Weekdays),
            "weekends" => Ok(Frequency::Weekends),
            "weekly" => Ok(Frequency::Weekly),
            _ => Err(anyhow::anyhow!("Invalid reminder frequency: {}", s)),
        }
    }
}

/// A stored reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    /// Store-assigned identifier, never reused
    pub id: String,

    /// User the reminder belongs to
    pub owner_id: String,

    pub kind: ReminderKind,

    pub title: String,

    /// Custom body text; empty or missing falls back to the kind default
    pub message: Option<String>,

    /// Local wall-clock time in `HH:mm`. Kept as text so a malformed stored
    /// value can be read back and rejected by the evaluator instead of the store.
    pub time_of_day: String,

    pub frequency: Frequency,

    /// Weekday indices, 0 = Sunday ... 6 = Saturday. Only read for `Weekly`.
    #[serde(default, deserialize_with = "deserialize_days")]
    pub days_of_week: Vec<i64>,

    pub enabled: bool,

    /// When the last notification for this reminder was delivered
    pub last_dispatched_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    /// Materialize a validated creation request into a fresh, enabled reminder
    pub fn from_new(id: String, owner_id: &str, new: NewReminder, now: DateTime<Utc>) -> Self {
        Reminder {
            id,
            owner_id: owner_id.to_string(),
            kind: new.kind,
            title: new.title,
            message: new.message.filter(|m| !m.trim().is_empty()),
            time_of_day: new.time_of_day,
            frequency: new.frequency,
            days_of_week: new.days_of_week,
            enabled: true,
            last_dispatched_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Parsed `HH:mm`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    /// Parse a strict 24-hour `HH:mm` string; anything else yields `None`
    pub fn parse(value: &str) -> Option<Self> {
        let caps = time_of_day_pattern()?.captures(value)?;
        let hour = caps.get(1)?.as_str().parse().ok()?;
        let minute = caps.get(2)?.as_str().parse().ok()?;
        Some(TimeOfDay { hour, minute })
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

fn time_of_day_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([0-1]\d|2[0-3]):([0-5]\d)$").ok())
        .as_ref()
}

/// Check a weekday list and return it sorted with duplicates removed
pub fn normalize_days_of_week(days: &[i64]) -> std::result::Result<Vec<i64>, String> {
    if let Some(bad) = days.iter().find(|d| !(0..=6).contains(*d)) {
        return Err(format!("weekday {bad} is out of range (0 = Sunday ... 6 = Saturday)"));
    }
    let mut normalized = days.to_vec();
    normalized.sort_unstable();
    normalized.dedup();
    Ok(normalized)
}

/// Creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReminder {
    pub kind: ReminderKind,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    pub time_of_day: String,
    pub frequency: Frequency,
    #[serde(default, deserialize_with = "deserialize_days")]
    pub days_of_week: Vec<i64>,
}

/// Partial edit; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReminderPatch {
    #[serde(default)]
    pub kind: Option<ReminderKind>,
    #[serde(default)]
    pub title: Option<String>,
    /// `Some("")` clears a custom message
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default, deserialize_with = "deserialize_optional_days")]
    pub days_of_week: Option<Vec<i64>>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Which reminders the scheduler looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every owner's reminders
    All,
    /// A single owner's reminders
    Owner(String),
}

impl Scope {
    /// Filter selecting the enabled reminders inside this scope
    pub fn enabled_filter(&self) -> ReminderFilter {
        let filter = ReminderFilter::default().enabled(true);
        match self {
            Scope::All => filter,
            Scope::Owner(owner) => filter.owner(owner.clone()),
        }
    }
}

/// Store query; every unset field matches anything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFilter {
    pub owner_id: Option<String>,
    pub kind: Option<ReminderKind>,
    pub enabled: Option<bool>,
}

impl ReminderFilter {
    pub fn owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn kind(mut self, kind: ReminderKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn matches(&self, reminder: &Reminder) -> bool {
        self.owner_id.as_deref().map_or(true, |o| o == reminder.owner_id)
            && self.kind.map_or(true, |k| k == reminder.kind)
            && self.enabled.map_or(true, |e| e == reminder.enabled)
    }
}

/// Weekdays arrive either as numbers or as numeric strings ("1")
#[derive(Deserialize)]
#[serde(untagged)]
enum DayValue {
    Index(i64),
    Text(String),
}

impl DayValue {
    fn into_index<E: de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            DayValue::Index(i) => Ok(i),
            DayValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| E::custom(format!("invalid weekday: {s:?}"))),
        }
    }
}

fn deserialize_days<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<DayValue>::deserialize(deserializer)?;
    raw.into_iter().map(DayValue::into_index).collect()
}

fn deserialize_optional_days<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<DayValue>>::deserialize(deserializer)?;
    raw.map(|days| {
        days.into_iter()
            .map(DayValue::into_index)
            .collect::<std::result::Result<Vec<i64>, D::Error>>()
    })
    .transpose()
}

/// Decode a weekday list stored as a JSON array, accepting numeric strings
pub fn days_from_json(text: &str) -> serde_json::Result<Vec<i64>> {
    #[derive(Deserialize)]
    struct Days(#[serde(deserialize_with = "deserialize_days")] Vec<i64>);

    serde_json::from_str::<Days>(text).map(|days| days.0)
}
