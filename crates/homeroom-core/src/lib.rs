//! `homeroom-core` — shared types, configuration, and time utilities.
//!
//! Everything here is transport-agnostic: identifiers, roles, the reminder
//! offset table, and the UTC↔local-wall-clock conversion helpers used by the
//! scheduler and the notifier.

pub mod config;
pub mod error;
pub mod localtime;
pub mod reminder;
pub mod types;

pub use config::HomeroomConfig;
pub use error::{HomeroomError, Result};
pub use reminder::{FiredReminder, OffsetLabel};
pub use types::{AssignmentId, GroupId, MemberId, UserRole};
