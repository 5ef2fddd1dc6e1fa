//! # Trigger Evaluator
//!
//! Decides whether a reminder should fire at a given instant. Pure: reads the
//! reminder's schedule and last dispatch, never touches a store or channel.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! Three gates, all of which must pass:
//!
//! 1. **Time window**: same hour as the target and within the minute tolerance.
//!    The window does not wrap across hours, so `23:59` never matches `00:00`.
//! 2. **Same-day dedup**: nothing already dispatched on the local calendar day
//!    of `now`.
//! 3. **Frequency**: daily, Mon-Fri, Sat/Sun, or one of the listed weekdays.
//!
//! Malformed schedules (bad `HH:mm`, weekday outside 0-6) are never due.
//!
//! ## Changelog
//! - 1.1.0: Generic over the clock's time zone; same-day dedup survives DST changes
//! - 1.0.0: Window, dedup and frequency gates

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};

use super::model::{Frequency, Reminder, TimeOfDay};

/// Default distance, in minutes, allowed between "now" and the target minute
pub const DEFAULT_MATCH_TOLERANCE_MINUTES: u32 = 1;

/// Outcome of evaluating one reminder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// All gates passed
    Due,
    /// Current time is not inside the reminder's time window
    OutsideWindow,
    /// A notification already went out on this calendar day
    AlreadyDispatchedToday,
    /// Today does not match the reminder's frequency
    FrequencyMismatch,
    /// Schedule data cannot be interpreted
    Malformed(String),
}

impl Verdict {
    pub fn is_due(&self) -> bool {
        matches!(self, Verdict::Due)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Due => write!(f, "due"),
            Verdict::OutsideWindow => write!(f, "outside time window"),
            Verdict::AlreadyDispatchedToday => write!(f, "already dispatched today"),
            Verdict::FrequencyMismatch => write!(f, "not scheduled today"),
            Verdict::Malformed(reason) => write!(f, "malformed schedule: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriggerEvaluator {
    tolerance_minutes: u32,
}

impl Default for TriggerEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_TOLERANCE_MINUTES)
    }
}

impl TriggerEvaluator {
    pub fn new(tolerance_minutes: u32) -> Self {
        TriggerEvaluator { tolerance_minutes }
    }

    pub fn tolerance_minutes(&self) -> u32 {
        self.tolerance_minutes
    }

    /// Run all gates and report which one stopped the reminder, if any
    pub fn evaluate<Tz: TimeZone>(
        &self,
        reminder: &Reminder,
        now: &DateTime<Tz>,
        last_dispatched_at: Option<&DateTime<Utc>>,
    ) -> Verdict {
        let Some(target) = TimeOfDay::parse(&reminder.time_of_day) else {
            return Verdict::Malformed(format!("invalid time of day {:?}", reminder.time_of_day));
        };

        if !self.in_window(target, now) {
            return Verdict::OutsideWindow;
        }

        if let Some(last) = last_dispatched_at {
            if same_local_day(last, now) {
                return Verdict::AlreadyDispatchedToday;
            }
        }

        frequency_gate(reminder, now)
    }

    pub fn is_due<Tz: TimeZone>(
        &self,
        reminder: &Reminder,
        now: &DateTime<Tz>,
        last_dispatched_at: Option<&DateTime<Utc>>,
    ) -> bool {
        self.evaluate(reminder, now, last_dispatched_at).is_due()
    }

    fn in_window<Tz: TimeZone>(&self, target: TimeOfDay, now: &DateTime<Tz>) -> bool {
        now.hour() == target.hour
            && (i64::from(now.minute()) - i64::from(target.minute)).abs()
                <= i64::from(self.tolerance_minutes)
    }
}

/// Evaluate with the default one-minute tolerance
pub fn is_due<Tz: TimeZone>(
    reminder: &Reminder,
    now: &DateTime<Tz>,
    last_dispatched_at: Option<&DateTime<Utc>>,
) -> bool {
    TriggerEvaluator::default().is_due(reminder, now, last_dispatched_at)
}

/// Compare calendar dates in `now`'s zone, reading `last` with the offset in
/// force at that instant rather than today's
fn same_local_day<Tz: TimeZone>(last: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    last.with_timezone(&now.timezone()).date_naive() == now.date_naive()
}

fn frequency_gate<Tz: TimeZone>(reminder: &Reminder, now: &DateTime<Tz>) -> Verdict {
    let weekday = now.weekday();
    let scheduled = match reminder.frequency {
        Frequency::Daily => true,
        Frequency::Weekdays => !matches!(weekday, Weekday::Sat | Weekday::Sun),
        Frequency::Weekends => matches!(weekday, Weekday::Sat | Weekday::Sun),
        Frequency::Weekly => {
            if let Some(bad) = reminder.days_of_week.iter().find(|d| !(0..=6).contains(*d)) {
                return Verdict::Malformed(format!("weekday {bad} out of range"));
            }
            let today = i64::from(weekday.num_days_from_sunday());
            reminder.days_of_week.contains(&today)
        }
    };

    if scheduled {
        Verdict::Due
    } else {
        Verdict::FrequencyMismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::test_zones::CentralEurope2024;
    use crate::features::reminders::model::ReminderKind;
    use chrono::{Duration, FixedOffset};

    /// UTC+8, so local and UTC calendar days disagree around midnight
    fn local(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, mi, s)
            .unwrap()
    }

    fn reminder(time: &str, frequency: Frequency, days: &[i64]) -> Reminder {
        let now = Utc::now();
        Reminder {
            id: "r1".to_string(),
            owner_id: "u1".to_string(),
            kind: ReminderKind::Weight,
            title: "Weigh in".to_string(),
            message: None,
            time_of_day: time.to_string(),
            frequency,
            days_of_week: days.to_vec(),
            enabled: true,
            last_dispatched_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    // 2024-03-04 is a Monday.

    #[test]
    fn test_first_window_entry_is_due() {
        let r = reminder("09:00", Frequency::Daily, &[]);
        let now = local(2024, 3, 4, 9, 0, 30);
        assert_eq!(TriggerEvaluator::default().evaluate(&r, &now, None), Verdict::Due);
        assert!(is_due(&r, &now, None));
    }

    #[test]
    fn test_dispatch_blocks_rest_of_window() {
        let r = reminder("09:00", Frequency::Daily, &[]);
        let dispatched = local(2024, 3, 4, 9, 0, 30).with_timezone(&Utc);
        let retry = local(2024, 3, 4, 9, 1, 10);
        assert_eq!(
            TriggerEvaluator::default().evaluate(&r, &retry, Some(&dispatched)),
            Verdict::AlreadyDispatchedToday
        );
    }

    #[test]
    fn test_tolerance_window_edges() {
        let r = reminder("09:30", Frequency::Daily, &[]);
        let evaluator = TriggerEvaluator::default();
        assert!(evaluator.is_due(&r, &local(2024, 3, 4, 9, 29, 0), None));
        assert!(evaluator.is_due(&r, &local(2024, 3, 4, 9, 31, 59), None));
        assert!(!evaluator.is_due(&r, &local(2024, 3, 4, 9, 28, 59), None));
        assert!(!evaluator.is_due(&r, &local(2024, 3, 4, 9, 32, 0), None));
        assert!(!evaluator.is_due(&r, &local(2024, 3, 4, 10, 30, 0), None));
    }

    #[test]
    fn test_custom_tolerance() {
        let r = reminder("09:30", Frequency::Daily, &[]);
        let strict = TriggerEvaluator::new(0);
        assert!(strict.is_due(&r, &local(2024, 3, 4, 9, 30, 59), None));
        assert!(!strict.is_due(&r, &local(2024, 3, 4, 9, 31, 0), None));

        let loose = TriggerEvaluator::new(5);
        assert!(loose.is_due(&r, &local(2024, 3, 4, 9, 35, 0), None));
    }

    #[test]
    fn test_window_does_not_wrap_across_hours() {
        let midnight = reminder("00:00", Frequency::Daily, &[]);
        assert!(!is_due(&midnight, &local(2024, 3, 4, 23, 59, 30), None));
        assert!(is_due(&midnight, &local(2024, 3, 5, 0, 1, 0), None));

        let top_of_hour = reminder("10:00", Frequency::Daily, &[]);
        assert!(!is_due(&top_of_hour, &local(2024, 3, 4, 9, 59, 0), None));
    }

    #[test]
    fn test_daily_fires_once_per_day_across_repeated_polls() {
        let r = reminder("07:15", Frequency::Daily, &[]);
        let mut last: Option<DateTime<Utc>> = None;
        let mut fired = 0;

        // Poll every 20 seconds from 07:13 to 07:18
        let mut now = local(2024, 3, 4, 7, 13, 0);
        let end = local(2024, 3, 4, 7, 18, 0);
        while now <= end {
            if is_due(&r, &now, last.as_ref()) {
                fired += 1;
                last = Some(now.with_timezone(&Utc));
            }
            now += Duration::seconds(20);
        }
        assert_eq!(fired, 1);

        // Next day, same window: eligible again
        assert!(is_due(&r, &local(2024, 3, 5, 7, 15, 0), last.as_ref()));
    }

    #[test]
    fn test_dedup_uses_local_calendar_day() {
        let r = reminder("00:00", Frequency::Daily, &[]);
        // 00:00:30 on the 5th locally is still the 4th in UTC
        let dispatched = local(2024, 3, 5, 0, 0, 30).with_timezone(&Utc);
        assert_eq!(dispatched.date_naive().day(), 4);

        assert!(!is_due(&r, &local(2024, 3, 5, 0, 1, 0), Some(&dispatched)));
        assert!(is_due(&r, &local(2024, 3, 6, 0, 0, 0), Some(&dispatched)));
    }

    #[test]
    fn test_previous_day_dispatch_does_not_block() {
        let r = reminder("21:00", Frequency::Daily, &[]);
        let yesterday = local(2024, 3, 3, 21, 0, 5).with_timezone(&Utc);
        assert!(is_due(&r, &local(2024, 3, 4, 21, 0, 5), Some(&yesterday)));
    }

    #[test]
    fn test_dedup_across_spring_forward() {
        let r = reminder("23:30", Frequency::Daily, &[]);
        // 23:30 at +01:00, the evening before clocks go forward
        let saturday = CentralEurope2024
            .with_ymd_and_hms(2024, 3, 30, 23, 30, 0)
            .unwrap();
        // 23:30 at +02:00; read at today's offset the dispatch above would be 00:30 today
        let sunday = CentralEurope2024
            .with_ymd_and_hms(2024, 3, 31, 23, 30, 0)
            .unwrap();
        let dispatched = saturday.with_timezone(&Utc);

        assert_eq!(
            TriggerEvaluator::default().evaluate(&r, &sunday, Some(&dispatched)),
            Verdict::Due
        );
        assert!(!is_due(&r, &saturday, Some(&dispatched)));
    }

    #[test]
    fn test_same_day_dispatch_blocks_after_spring_forward() {
        let r = reminder("04:00", Frequency::Daily, &[]);
        // 00:30 winter time, before the 02:00 -> 03:00 jump
        let early = CentralEurope2024
            .with_ymd_and_hms(2024, 3, 31, 0, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        let later = CentralEurope2024
            .with_ymd_and_hms(2024, 3, 31, 4, 0, 0)
            .unwrap();
        assert_eq!(
            TriggerEvaluator::default().evaluate(&r, &later, Some(&early)),
            Verdict::AlreadyDispatchedToday
        );
    }

    #[test]
    fn test_weekdays_and_weekends() {
        let weekdays = reminder("12:00", Frequency::Weekdays, &[]);
        let weekends = reminder("12:00", Frequency::Weekends, &[]);

        // Mon 4th .. Sun 10th
        for day in 4..=8 {
            let now = local(2024, 3, day, 12, 0, 0);
            assert!(is_due(&weekdays, &now, None), "weekday {day}");
            assert!(!is_due(&weekends, &now, None), "weekday {day}");
        }
        for day in 9..=10 {
            let now = local(2024, 3, day, 12, 0, 0);
            assert!(!is_due(&weekdays, &now, None), "weekend {day}");
            assert!(is_due(&weekends, &now, None), "weekend {day}");
        }
    }

    #[test]
    fn test_weekly_mon_wed_fri() {
        let r = reminder("08:00", Frequency::Weekly, &[1, 3, 5]);
        let tuesday = local(2024, 3, 5, 8, 0, 0);
        let wednesday = local(2024, 3, 6, 8, 0, 0);
        assert_eq!(
            TriggerEvaluator::default().evaluate(&r, &tuesday, None),
            Verdict::FrequencyMismatch
        );
        assert!(is_due(&r, &wednesday, None));
    }

    #[test]
    fn test_weekly_sunday_is_zero() {
        let r = reminder("08:00", Frequency::Weekly, &[0]);
        assert!(is_due(&r, &local(2024, 3, 10, 8, 0, 0), None));
        assert!(!is_due(&r, &local(2024, 3, 9, 8, 0, 0), None));
    }

    #[test]
    fn test_weekly_without_days_is_never_due() {
        let r = reminder("08:00", Frequency::Weekly, &[]);
        for day in 4..=10 {
            for minute in 0..=1 {
                assert!(!is_due(&r, &local(2024, 3, day, 8, minute, 0), None));
            }
        }
    }

    #[test]
    fn test_days_ignored_unless_weekly() {
        let r = reminder("08:00", Frequency::Daily, &[42]);
        assert!(is_due(&r, &local(2024, 3, 5, 8, 0, 0), None));
    }

    #[test]
    fn test_malformed_schedules_fail_closed() {
        let evaluator = TriggerEvaluator::default();
        let now = local(2024, 3, 4, 8, 0, 0);

        for bad_time in ["8:00", "24:00", "08:61", "", "noon"] {
            let r = reminder(bad_time, Frequency::Daily, &[]);
            assert!(matches!(evaluator.evaluate(&r, &now, None), Verdict::Malformed(_)));
        }

        let r = reminder("08:00", Frequency::Weekly, &[1, 7]);
        assert!(matches!(evaluator.evaluate(&r, &now, None), Verdict::Malformed(_)));
        assert!(!evaluator.is_due(&r, &now, None));
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Due.to_string(), "due");
        assert_eq!(
            Verdict::Malformed("bad".to_string()).to_string(),
            "malformed schedule: bad"
        );
    }
}
