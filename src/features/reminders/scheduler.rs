//! # Reminder Scheduler
//!
//! Periodic loop that fetches enabled reminders, evaluates each against the
//! clock, delivers the due ones and records the dispatch.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Generic over the clock's time zone; ticks count dispatches of deleted reminders
//! - 1.0.0: Tick loop with overlap guard and graceful stop
//!
//! ## Delivery contract
//!
//! The dispatch timestamp is written only after the channel accepts the
//! notification. A failed delivery leaves the reminder eligible for the next
//! tick inside its window; a failed write after a successful delivery can
//! produce one duplicate on the next tick. Duplicates are preferred over
//! silently dropped reminders.

use anyhow::{Context, Result};
use chrono::{Offset, TimeZone};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::evaluator::{TriggerEvaluator, Verdict, DEFAULT_MATCH_TOLERANCE_MINUTES};
use super::message::build_notification;
use super::model::{Reminder, Scope};
use crate::core::clock::{Clock, SystemClock};
use crate::database::{DispatchDay, DispatchRecord, ReminderStore};
use crate::features::notifications::{DeliveryError, NotificationChannel};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub match_tolerance_minutes: u32,
    /// Whose reminders this agent dispatches
    pub scope: Scope,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            tick_interval: DEFAULT_TICK_INTERVAL,
            match_tolerance_minutes: DEFAULT_MATCH_TOLERANCE_MINUTES,
            scope: Scope::All,
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// A previous tick was still running; nothing was done
    pub skipped: bool,
    /// The store could not be read; nothing was evaluated
    pub fetch_failed: bool,
    pub evaluated: usize,
    pub due: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
    pub recorded: usize,
    /// Delivered, but another agent had already recorded today's dispatch
    pub already_recorded: usize,
    /// Delivered, but the reminder was deleted before the dispatch was recorded
    pub missing: usize,
    pub persist_failures: usize,
}

pub struct ReminderScheduler<C: Clock = SystemClock> {
    store: Arc<dyn ReminderStore>,
    channel: Arc<dyn NotificationChannel>,
    clock: Arc<C>,
    evaluator: TriggerEvaluator,
    config: SchedulerConfig,
    checking: AtomicBool,
}

/// Clears the in-flight flag however the tick exits
struct CheckingGuard<'a>(&'a AtomicBool);

impl Drop for CheckingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C> ReminderScheduler<C>
where
    C: Clock + 'static,
    <C::Tz as TimeZone>::Offset: Send + Sync,
{
    pub fn new(
        store: Arc<dyn ReminderStore>,
        channel: Arc<dyn NotificationChannel>,
        clock: Arc<C>,
        config: SchedulerConfig,
    ) -> Self {
        ReminderScheduler {
            store,
            channel,
            clock,
            evaluator: TriggerEvaluator::new(config.match_tolerance_minutes),
            config,
            checking: AtomicBool::new(false),
        }
    }

    /// Run one fetch/evaluate/deliver/record pass.
    ///
    /// Never fails: store and channel errors are logged and counted in the
    /// report so the loop keeps going. A tick started while another is still
    /// running returns immediately with `skipped` set.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        if self
            .checking
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Previous reminder check still running, skipping tick");
            report.skipped = true;
            return report;
        }
        let _guard = CheckingGuard(&self.checking);

        let now = self.clock.now();
        let reminders = match self.store.list_enabled(&self.config.scope).await {
            Ok(reminders) => reminders,
            Err(e) => {
                warn!("Failed to fetch reminders: {e:#}");
                report.fetch_failed = true;
                return report;
            }
        };

        debug!(
            "Checking {} reminder(s) at {}",
            reminders.len(),
            now.with_timezone(&now.offset().fix()).format("%Y-%m-%d %H:%M %:z")
        );

        for reminder in &reminders {
            report.evaluated += 1;
            match self
                .evaluator
                .evaluate(reminder, &now, reminder.last_dispatched_at.as_ref())
            {
                Verdict::Due => {}
                Verdict::Malformed(reason) => {
                    warn!("Ignoring malformed reminder {}: {reason}", reminder.id);
                    continue;
                }
                other => {
                    debug!("Reminder {} not due: {other}", reminder.id);
                    continue;
                }
            }

            report.due += 1;
            self.dispatch(reminder, DispatchDay::of(&now), &mut report).await;
        }

        report
    }

    async fn dispatch(
        &self,
        reminder: &Reminder,
        day: DispatchDay,
        report: &mut TickReport,
    ) {
        let notification = build_notification(reminder);

        if let Err(e) = self.channel.deliver(&notification).await {
            report.delivery_failures += 1;
            match e {
                DeliveryError::NotGranted(_) | DeliveryError::Unsupported => {
                    debug!("Reminder {} not delivered: {e}", reminder.id)
                }
                DeliveryError::Transient(_) => {
                    warn!("Failed to deliver reminder {}: {e}", reminder.id)
                }
            }
            return;
        }
        report.delivered += 1;

        match self.store.update_last_dispatched(&reminder.id, day).await {
            Ok(DispatchRecord::Recorded) => {
                report.recorded += 1;
                info!(
                    "Reminder {} ({}) sent via {}",
                    reminder.id,
                    reminder.kind,
                    self.channel.name()
                );
            }
            Ok(DispatchRecord::AlreadyRecorded) => {
                report.already_recorded += 1;
                info!(
                    "Reminder {} was already dispatched today by another agent",
                    reminder.id
                );
            }
            Ok(DispatchRecord::Missing) => {
                report.missing += 1;
                debug!("Reminder {} was deleted during delivery", reminder.id);
            }
            Err(e) => {
                report.persist_failures += 1;
                warn!(
                    "Delivered reminder {} but failed to record it: {e:#}",
                    reminder.id
                );
            }
        }
    }

    /// Spawn the tick loop. The first tick runs immediately.
    ///
    /// Dropping the returned handle also stops the loop after the current tick.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(stop_rx).await;
        });
        SchedulerHandle { stop_tx, task }
    }

    async fn run(&self, mut stop_rx: watch::Receiver<bool>) {
        let period = if self.config.tick_interval.is_zero() {
            warn!("Tick interval of zero requested, using {DEFAULT_TICK_INTERVAL:?}");
            DEFAULT_TICK_INTERVAL
        } else {
            self.config.tick_interval
        };
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Reminder scheduler started (interval: {period:?}, tolerance: ±{} min, via {})",
            self.evaluator.tolerance_minutes(),
            self.channel.name()
        );

        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            // In-flight ticks are never cancelled; stop is only observed between ticks
            let report = self.tick().await;
            if report.delivered > 0 || report.delivery_failures > 0 || report.persist_failures > 0 {
                info!(
                    "Reminder tick: {} due, {} delivered, {} failed, {} persist failure(s)",
                    report.due, report.delivered, report.delivery_failures, report.persist_failures
                );
            }

            if *stop_rx.borrow() {
                break;
            }
        }

        info!("Reminder scheduler stopped");
    }
}

/// Control handle for a running scheduler loop
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Ask the loop to exit after the tick in progress, if any
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop task to exit
    pub async fn join(self) -> Result<()> {
        self.task.await.context("Reminder scheduler task failed")
    }

    pub async fn shutdown(self) -> Result<()> {
        self.stop();
        self.join().await
    }
}
