use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use homeroom_core::types::{AssignmentId, GroupId, MemberId};

/// A class/cohort of recipients sharing a timezone and an owning teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    /// Display name — unique across the deployment.
    pub name: String,
    /// Transport address of the owning teacher; the delivery summary goes here.
    pub owner_address: String,
    /// IANA zone identifier, validated when the group is created.
    pub timezone: String,
}

/// A roster member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Optional public handle, stored without any leading `@`.
    pub handle: Option<String>,
    /// Transport address; `None` until the member's chat is bound.
    pub address: Option<String>,
}

/// A member as seen by the notifier: name plus reachability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub address: Option<String>,
}

/// A unit of homework with a deadline, scoped to one group.
///
/// Immutable once created; the deadline is a UTC instant and display
/// conversion always goes through the group's timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub group_id: GroupId,
    pub title: String,
    pub description: Option<String>,
    pub due_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// An assignment joined with its group's name and timezone, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentOverview {
    pub assignment: Assignment,
    pub group_name: String,
    pub timezone: String,
}

/// A persisted reminder instant derived from an assignment's deadline.
///
/// `label` is the stored string form of the offset label; the scheduler
/// decodes it at the boundary when rehydrating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderJob {
    pub id: i64,
    pub assignment_id: AssignmentId,
    pub fire_at: DateTime<Utc>,
    pub label: String,
}
