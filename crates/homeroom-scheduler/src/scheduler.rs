//! Translates assignment deadlines into persisted, armed reminder jobs.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use homeroom_core::reminder::OffsetLabel;
use homeroom_core::types::AssignmentId;
use homeroom_store::Store;

use crate::error::Result;
use crate::executor::{ArmedReminder, ReminderExecutor};

/// Computes, persists, and arms the reminder set for assignments.
///
/// Holds no job state of its own — persisted rows live in the [`Store`],
/// armed handles in the [`ReminderExecutor`]. That split is what makes both
/// re-invocation and restart recovery idempotent.
pub struct ReminderScheduler {
    store: Store,
    executor: ReminderExecutor,
}

impl ReminderScheduler {
    pub fn new(store: Store, executor: ReminderExecutor) -> Self {
        Self { store, executor }
    }

    /// Schedule every still-future reminder for one assignment.
    ///
    /// Missing assignment or group is a benign race with deletion: logged,
    /// `Ok(())`. A store failure aborts the affected job *before* it is
    /// armed and propagates — an unpersisted reminder must not fire, and
    /// the caller needs to know the set may be incomplete.
    pub fn schedule_for_assignment(&self, assignment_id: AssignmentId) -> Result<()> {
        self.schedule_at(assignment_id, Utc::now())
    }

    /// Like [`Self::schedule_for_assignment`] with an explicit "now".
    ///
    /// `now` is captured once and reused for every offset comparison so the
    /// skip decisions are consistent across the whole set.
    pub fn schedule_at(&self, assignment_id: AssignmentId, now: DateTime<Utc>) -> Result<()> {
        let Some(assignment) = self.store.assignment(assignment_id)? else {
            info!(%assignment_id, "assignment vanished before scheduling — skipping");
            return Ok(());
        };
        let Some(_group) = self.store.group(assignment.group_id)? else {
            info!(
                %assignment_id,
                group_id = %assignment.group_id,
                "group vanished before scheduling — skipping"
            );
            return Ok(());
        };

        for label in OffsetLabel::ALL {
            let fire_at = label.fire_at(assignment.due_at);
            if fire_at <= now {
                debug!(%assignment_id, %label, %fire_at, "fire instant already passed — not scheduled");
                continue;
            }

            // Persist-then-arm. The insert is the dedup point: if the row
            // already exists this call is a replay and nothing is re-armed
            // here (the original registration, or rehydration, owns it).
            if !self
                .store
                .insert_job_if_absent(assignment_id, fire_at, label.as_str())?
            {
                debug!(%assignment_id, %label, "reminder job already persisted");
                continue;
            }

            let fresh = self.executor.arm(ArmedReminder {
                assignment_id,
                label,
                fire_at,
            });
            if fresh {
                info!(%assignment_id, %label, %fire_at, "reminder scheduled");
            } else {
                // Freshly inserted row but the key was armed already — a
                // concurrent replay won the race. Harmless.
                debug!(%assignment_id, %label, "reminder already armed");
            }
        }

        Ok(())
    }

    /// Re-arm every persisted job still in the future.
    ///
    /// Runs once at startup, before intake begins. Jobs whose instant
    /// passed while the process was down stay in the table untouched and
    /// are never fired late — at-most-once, no catch-up.
    pub fn rehydrate(&self) -> Result<()> {
        self.rehydrate_at(Utc::now())
    }

    /// Like [`Self::rehydrate`] with an explicit "now".
    pub fn rehydrate_at(&self, now: DateTime<Utc>) -> Result<()> {
        let jobs = self.store.future_jobs(now)?;
        let mut armed = 0usize;
        for job in jobs {
            // Decode the stored label at the boundary; an unknown label
            // means a schema from the future and is skipped, not fatal.
            let label: OffsetLabel = match job.label.parse() {
                Ok(label) => label,
                Err(_) => {
                    warn!(
                        job_id = job.id,
                        label = %job.label,
                        "unknown reminder label in store — skipping"
                    );
                    continue;
                }
            };
            let fresh = self.executor.arm(ArmedReminder {
                assignment_id: job.assignment_id,
                label,
                fire_at: job.fire_at,
            });
            if fresh {
                armed += 1;
            }
        }
        info!(count = armed, "rehydrated future reminders");
        Ok(())
    }
}
