use serde::{Deserialize, Serialize};
use std::fmt;

/// Row identifier of a group (class/cohort).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for GroupId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Row identifier of a roster member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(pub i64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MemberId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Row identifier of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(pub i64);

impl fmt::Display for AssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AssignmentId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Account role hierarchy: global admin > local admin > user.
///
/// Global admins administer the deployment itself; local admins are the
/// teachers who manage groups, rosters, and homework; regular users can only
/// view what concerns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    GlobalAdmin,
    LocalAdmin,
    #[default]
    User,
}

impl UserRole {
    pub fn is_global_admin(&self) -> bool {
        matches!(self, UserRole::GlobalAdmin)
    }

    /// True for roles allowed to manage groups, rosters, and assignments.
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::GlobalAdmin | UserRole::LocalAdmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::GlobalAdmin => write!(f, "global_admin"),
            UserRole::LocalAdmin => write!(f, "local_admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "global_admin" => Ok(UserRole::GlobalAdmin),
            "local_admin" => Ok(UserRole::LocalAdmin),
            "user" => Ok(UserRole::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}
