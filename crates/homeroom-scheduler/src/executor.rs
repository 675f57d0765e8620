//! In-process one-shot executor.
//!
//! Holds the armed-reminder registry and a one-second tick loop that hands
//! due reminders to the delivery channel. Arming is insert-if-absent on a
//! deterministic key, so the same logical job re-derived from persisted
//! state (fresh scheduling and rehydration alike) can never double-fire.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use homeroom_core::reminder::{FiredReminder, OffsetLabel};
use homeroom_core::types::AssignmentId;

/// A reminder registered with the executor but not yet due.
///
/// Per job the conceptual lifecycle is Pending (persisted row) → Armed
/// (entry in this registry) → Fired (handed to delivery) → terminal. There
/// is no Failed state: delivery problems belong to the notifier and never
/// re-arm the job.
#[derive(Debug, Clone)]
pub struct ArmedReminder {
    pub assignment_id: AssignmentId,
    pub label: OffsetLabel,
    pub fire_at: DateTime<Utc>,
}

/// Cloneable handle over the armed registry plus the tick loop driver.
///
/// The scheduler arms entries from whatever task it runs on while the
/// engine loop drains due ones; `DashMap` keeps both sides lock-light.
#[derive(Clone)]
pub struct ReminderExecutor {
    armed: Arc<DashMap<String, ArmedReminder>>,
    fired_tx: mpsc::Sender<FiredReminder>,
}

impl ReminderExecutor {
    /// Fired reminders are sent to `fired_tx`; the send is non-blocking
    /// (`try_send`) so a slow consumer can never stall the tick loop.
    pub fn new(fired_tx: mpsc::Sender<FiredReminder>) -> Self {
        Self {
            armed: Arc::new(DashMap::new()),
            fired_tx,
        }
    }

    /// Deterministic registry key for one logical job.
    ///
    /// Derived purely from persisted fields, so re-deriving the same job on
    /// restart yields the same identity.
    pub fn job_key(assignment_id: AssignmentId, label: OffsetLabel, fire_at: DateTime<Utc>) -> String {
        format!("asg{}_{}_{}", assignment_id, label, fire_at.timestamp())
    }

    /// Arm a one-shot reminder. Returns `false` when the key is already
    /// registered — the caller treats that as "someone got here first".
    pub fn arm(&self, reminder: ArmedReminder) -> bool {
        let key = Self::job_key(reminder.assignment_id, reminder.label, reminder.fire_at);
        match self.armed.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(reminder);
                true
            }
        }
    }

    /// Number of currently armed reminders.
    pub fn armed_len(&self) -> usize {
        self.armed.len()
    }

    /// Main event loop. Ticks every second until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("reminder executor started");
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(Utc::now());
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("reminder executor shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fire everything due at `now`. Public so tests can drive time directly.
    pub fn tick(&self, now: DateTime<Utc>) {
        // Collect keys first; removal while iterating a DashMap can deadlock
        // on the same shard.
        let due: Vec<String> = self
            .armed
            .iter()
            .filter(|entry| entry.value().fire_at <= now)
            .map(|entry| entry.key().clone())
            .collect();

        for key in due {
            let Some((_, reminder)) = self.armed.remove(&key) else {
                continue;
            };
            debug!(job_key = %key, "reminder due");
            let fired = FiredReminder {
                assignment_id: reminder.assignment_id,
                label: reminder.label,
                fire_at: reminder.fire_at,
            };
            // try_send never blocks the tick loop; an overloaded or closed
            // channel drops the reminder (at-most-once holds either way).
            if self.fired_tx.try_send(fired).is_err() {
                warn!(job_key = %key, "delivery channel full or closed — reminder dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn executor() -> (ReminderExecutor, mpsc::Receiver<FiredReminder>) {
        let (tx, rx) = mpsc::channel(16);
        (ReminderExecutor::new(tx), rx)
    }

    fn reminder(id: i64, label: OffsetLabel, fire_at: DateTime<Utc>) -> ArmedReminder {
        ArmedReminder {
            assignment_id: AssignmentId(id),
            label,
            fire_at,
        }
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let (exec, _rx) = executor();
        let at = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
        assert!(exec.arm(reminder(1, OffsetLabel::T0, at)));
        assert!(!exec.arm(reminder(1, OffsetLabel::T0, at)));
        // a different label at the same instant is a different job
        assert!(exec.arm(reminder(1, OffsetLabel::T15m, at)));
        assert_eq!(exec.armed_len(), 2);
    }

    #[tokio::test]
    async fn tick_fires_only_due_reminders() {
        let (exec, mut rx) = executor();
        let now = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
        exec.arm(reminder(1, OffsetLabel::T0, now - Duration::seconds(1)));
        exec.arm(reminder(2, OffsetLabel::T0, now + Duration::hours(1)));

        exec.tick(now);

        let fired = rx.try_recv().unwrap();
        assert_eq!(fired.assignment_id, AssignmentId(1));
        assert!(rx.try_recv().is_err(), "future reminder must stay armed");
        assert_eq!(exec.armed_len(), 1);
    }

    #[tokio::test]
    async fn fired_reminder_is_gone_from_the_registry() {
        let (exec, mut rx) = executor();
        let now = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
        exec.arm(reminder(1, OffsetLabel::T3h, now));

        exec.tick(now);
        exec.tick(now + Duration::seconds(1));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "a one-shot job fires exactly once");
        assert_eq!(exec.armed_len(), 0);
    }

    #[test]
    fn key_is_deterministic_across_derivations() {
        let at = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
        let a = ReminderExecutor::job_key(AssignmentId(7), OffsetLabel::T3h, at);
        let b = ReminderExecutor::job_key(AssignmentId(7), OffsetLabel::T3h, at);
        assert_eq!(a, b);
        assert_eq!(a, format!("asg7_T-3h_{}", at.timestamp()));
    }
}
