//! Notification text for due reminders
//!
//! - **Version**: 1.0.1
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.1: Custom messages are sent exactly as stored
//! - 1.0.0: Default texts and dedup tags

use super::model::{Reminder, ReminderKind};
use crate::features::notifications::Notification;

/// Body used when a reminder has no message of its own
pub fn default_message(kind: ReminderKind) -> &'static str {
    match kind {
        ReminderKind::Weight => "Don't forget to log today's weight!",
        ReminderKind::Workout => "Time to work out, get moving!",
        ReminderKind::Food => "Remember to log what you ate!",
        ReminderKind::Water => "Time for some water, staying hydrated matters!",
        ReminderKind::Sleep => "Time to get ready for bed, good sleep matters!",
        ReminderKind::Other => "You have a health reminder",
    }
}

/// Custom message if it has any content, otherwise the kind default
pub fn format_reminder_message(kind: ReminderKind, message: Option<&str>) -> String {
    match message {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => default_message(kind).to_string(),
    }
}

/// Stable per-reminder tag so tag-aware sinks can collapse duplicates
pub fn dedup_tag(reminder_id: &str) -> String {
    format!("reminder-{reminder_id}")
}

/// Build the notification the scheduler hands to the channel
pub fn build_notification(reminder: &Reminder) -> Notification {
    Notification {
        title: reminder.title.clone(),
        body: format_reminder_message(reminder.kind, reminder.message.as_deref()),
        tag: dedup_tag(&reminder.id),
        require_interaction: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_message_wins() {
        assert_eq!(
            format_reminder_message(ReminderKind::Water, Some("Drink 500ml")),
            "Drink 500ml"
        );
    }

    #[test]
    fn test_custom_message_sent_verbatim() {
        assert_eq!(
            format_reminder_message(ReminderKind::Food, Some("  Log lunch\n")),
            "  Log lunch\n"
        );
    }

    #[test]
    fn test_blank_message_uses_default() {
        assert_eq!(
            format_reminder_message(ReminderKind::Sleep, Some("  ")),
            default_message(ReminderKind::Sleep)
        );
        assert_eq!(
            format_reminder_message(ReminderKind::Weight, None),
            "Don't forget to log today's weight!"
        );
        assert_eq!(
            format_reminder_message(ReminderKind::Other, None),
            "You have a health reminder"
        );
    }

    #[test]
    fn test_dedup_tag() {
        assert_eq!(dedup_tag("abc-123"), "reminder-abc-123");
    }
}
