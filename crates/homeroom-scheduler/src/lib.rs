//! `homeroom-scheduler` — derives reminder jobs from assignment deadlines
//! and drives their execution.
//!
//! # Overview
//!
//! When an assignment is created, [`ReminderScheduler::schedule_for_assignment`]
//! computes one fire instant per offset label, persists each as a
//! `reminder_jobs` row (insert-if-absent, so re-computation never
//! duplicates), and arms a one-shot entry with the [`executor::ReminderExecutor`].
//! Persistence strictly precedes arming: a crash between the two is
//! recovered by rehydration, and a crash before the insert leaves no
//! orphaned timer.
//!
//! # Offsets
//!
//! | label  | fires                      |
//! |--------|----------------------------|
//! | `T-24h`| 24 hours before the deadline |
//! | `T-3h` | 3 hours before             |
//! | `T-15m`| 15 minutes before          |
//! | `T0`   | at the deadline            |
//!
//! Instants already in the past at scheduling time are skipped outright.
//!
//! # Restart recovery
//!
//! [`ReminderScheduler::rehydrate`] runs once at startup, before intake
//! begins: every persisted job still in the future is re-armed under the
//! same deterministic key. Jobs whose instant passed while the process was
//! down are dropped — at-most-once, never fired late, never retried.

pub mod error;
pub mod executor;
pub mod scheduler;

pub use error::{Result, SchedulerError};
pub use executor::{ArmedReminder, ReminderExecutor};
pub use homeroom_core::reminder::{FiredReminder, OffsetLabel};
pub use scheduler::ReminderScheduler;
