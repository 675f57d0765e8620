//! Reminder message texts.

use chrono_tz::Tz;

use homeroom_core::localtime;
use homeroom_core::reminder::OffsetLabel;
use homeroom_store::{Assignment, Group};

/// The message every enrolled member receives.
///
/// The deadline is rendered in the group's local time with the zone name
/// spelled out, so "18:00" never means two different things to two groups.
pub fn reminder_body(label: OffsetLabel, group: &Group, assignment: &Assignment, tz: Tz) -> String {
    let due_local = localtime::fmt_local(assignment.due_at, tz);
    let description = assignment.description.as_deref().unwrap_or("—");
    format!(
        "⏰ Reminder ({label})\n\
         Group: {}\n\
         Assignment: {}\n\
         Due: {due_local} {}\n\
         \n\
         Details: {description}",
        group.name, assignment.title, group.timezone,
    )
}

/// The owner's copy: the member body plus whoever could not be reached.
pub fn owner_summary(body: &str, unreachable: &[String]) -> String {
    if unreachable.is_empty() {
        body.to_string()
    } else {
        format!("{body}\n\n⚠️ Unreachable: {}", unreachable.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono::Utc;
    use homeroom_core::types::{AssignmentId, GroupId};

    fn fixture() -> (Group, Assignment) {
        let group = Group {
            id: GroupId(1),
            name: "RoboticsA".to_string(),
            owner_address: "t:owner".to_string(),
            timezone: "Europe/Moscow".to_string(),
        };
        let assignment = Assignment {
            id: AssignmentId(1),
            group_id: group.id,
            title: "Blink LED".to_string(),
            description: Some("PWM on pin 2".to_string()),
            due_at: Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2025, 9, 20, 10, 0, 0).unwrap(),
        };
        (group, assignment)
    }

    #[test]
    fn body_shows_deadline_in_group_local_time() {
        let (group, assignment) = fixture();
        let tz = localtime::parse_zone(&group.timezone).unwrap();
        let body = reminder_body(OffsetLabel::T3h, &group, &assignment, tz);
        assert!(body.contains("Reminder (T-3h)"));
        assert!(body.contains("2025-09-25 21:00 Europe/Moscow"));
        assert!(body.contains("Blink LED"));
        assert!(body.contains("PWM on pin 2"));
    }

    #[test]
    fn missing_description_renders_as_dash() {
        let (group, mut assignment) = fixture();
        assignment.description = None;
        let tz = localtime::parse_zone(&group.timezone).unwrap();
        let body = reminder_body(OffsetLabel::T0, &group, &assignment, tz);
        assert!(body.contains("Details: —"));
    }

    #[test]
    fn summary_lists_unreachable_members() {
        let with = owner_summary("body", &["bob".to_string(), "carol".to_string()]);
        assert!(with.ends_with("⚠️ Unreachable: bob, carol"));
        let without = owner_summary("body", &[]);
        assert_eq!(without, "body");
    }
}
