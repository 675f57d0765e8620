//! Reminder types shared between the scheduler and the notifier.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AssignmentId;

/// Named lead time before an assignment deadline.
///
/// The set is fixed and ordered from furthest-out to the deadline itself.
/// `T0` fires at the deadline. The label string is what gets persisted in
/// the `reminder_jobs.label` column, so the `Display`/`FromStr` forms are a
/// storage contract — do not change them without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OffsetLabel {
    #[serde(rename = "T-24h")]
    T24h,
    #[serde(rename = "T-3h")]
    T3h,
    #[serde(rename = "T-15m")]
    T15m,
    #[serde(rename = "T0")]
    T0,
}

impl OffsetLabel {
    /// Every label, in scheduling order.
    pub const ALL: [OffsetLabel; 4] = [
        OffsetLabel::T24h,
        OffsetLabel::T3h,
        OffsetLabel::T15m,
        OffsetLabel::T0,
    ];

    /// How long before the deadline this reminder fires.
    pub fn lead_time(&self) -> Duration {
        match self {
            OffsetLabel::T24h => Duration::hours(24),
            OffsetLabel::T3h => Duration::hours(3),
            OffsetLabel::T15m => Duration::minutes(15),
            OffsetLabel::T0 => Duration::zero(),
        }
    }

    /// The fire instant for this label relative to `due_at`.
    pub fn fire_at(&self, due_at: DateTime<Utc>) -> DateTime<Utc> {
        due_at - self.lead_time()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetLabel::T24h => "T-24h",
            OffsetLabel::T3h => "T-3h",
            OffsetLabel::T15m => "T-15m",
            OffsetLabel::T0 => "T0",
        }
    }
}

impl std::fmt::Display for OffsetLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OffsetLabel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "T-24h" => Ok(OffsetLabel::T24h),
            "T-3h" => Ok(OffsetLabel::T3h),
            "T-15m" => Ok(OffsetLabel::T15m),
            "T0" => Ok(OffsetLabel::T0),
            other => Err(format!("unknown reminder label: {other}")),
        }
    }
}

/// A reminder the executor has handed off for delivery.
///
/// Carries just enough to identify the reminder; the notifier re-fetches the
/// assignment and its group fresh from the store at fire time rather than
/// trusting any snapshot captured when the job was armed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredReminder {
    pub assignment_id: AssignmentId,
    pub label: OffsetLabel,
    /// The instant the job was scheduled to fire — for log correlation.
    pub fire_at: DateTime<Utc>,
}
