use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info};

use homeroom_core::localtime;
use homeroom_core::types::{AssignmentId, GroupId, MemberId};

use crate::db::init_db;
use crate::error::{Result, StoreError};
use crate::types::{Assignment, AssignmentOverview, Group, Member, Recipient, ReminderJob};

/// Thread-safe handle over the service database.
///
/// Wraps a single SQLite connection in a `Mutex`; clones share the
/// connection. For a single-node deployment this is sufficient — writers
/// are short transactions and SQLite serialises them anyway.
#[derive(Clone)]
pub struct Store {
    db: Arc<Mutex<Connection>>,
}

impl Store {
    /// Wrap an already-open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open (or create) the database file at `path` in WAL mode.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Self::new(conn)
    }

    // --- groups ------------------------------------------------------------

    /// Create a group. The name must be unique and the timezone a valid
    /// IANA identifier — this is the one place zone ids are validated.
    pub fn create_group(&self, name: &str, owner_address: &str, timezone: &str) -> Result<Group> {
        localtime::parse_zone(timezone)
            .map_err(|_| StoreError::InvalidTimezone(timezone.to_string()))?;

        let db = self.db.lock().unwrap();
        let inserted = db.execute(
            "INSERT INTO groups (name, owner_address, timezone) VALUES (?1, ?2, ?3)",
            params![name, owner_address, timezone],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::GroupExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        let id = db.last_insert_rowid();
        info!(group_id = id, %name, %timezone, "group created");
        Ok(Group {
            id: GroupId(id),
            name: name.to_string(),
            owner_address: owner_address.to_string(),
            timezone: timezone.to_string(),
        })
    }

    /// Fetch a group by id, `None` if it no longer exists.
    pub fn group(&self, id: GroupId) -> Result<Option<Group>> {
        let db = self.db.lock().unwrap();
        optional(db.query_row(
            "SELECT id, name, owner_address, timezone FROM groups WHERE id = ?1",
            params![id.0],
            row_to_group,
        ))
    }

    pub fn group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let db = self.db.lock().unwrap();
        optional(db.query_row(
            "SELECT id, name, owner_address, timezone FROM groups WHERE name = ?1",
            params![name],
            row_to_group,
        ))
    }

    /// All groups, sorted by name (case-insensitive).
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, name, owner_address, timezone FROM groups
             ORDER BY name COLLATE NOCASE ASC",
        )?;
        let rows = stmt.query_map([], row_to_group)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // --- roster ------------------------------------------------------------

    /// Insert a member, or update the handle if the name already exists.
    pub fn upsert_member(&self, name: &str, handle: Option<&str>) -> Result<Member> {
        let handle = handle.map(|h| h.trim_start_matches('@'));
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO members (name, handle) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET handle = excluded.handle",
            params![name, handle],
        )?;
        // Read back — the row may predate this call and carry a bound address.
        let member = db.query_row(
            "SELECT id, name, handle, address FROM members WHERE name = ?1",
            params![name],
            row_to_member,
        )?;
        debug!(member_id = %member.id, %name, "member upserted");
        Ok(member)
    }

    pub fn member_by_name(&self, name: &str) -> Result<Option<Member>> {
        let db = self.db.lock().unwrap();
        optional(db.query_row(
            "SELECT id, name, handle, address FROM members WHERE name = ?1",
            params![name],
            row_to_member,
        ))
    }

    /// Bind a transport address to a member ("register chat").
    pub fn bind_member_address(&self, name: &str, address: &str) -> Result<Member> {
        let db = self.db.lock().unwrap();
        let changed = db.execute(
            "UPDATE members SET address = ?1 WHERE name = ?2",
            params![address, name],
        )?;
        if changed == 0 {
            return Err(StoreError::MemberNotFound(name.to_string()));
        }
        let member = db.query_row(
            "SELECT id, name, handle, address FROM members WHERE name = ?1",
            params![name],
            row_to_member,
        )?;
        info!(member_id = %member.id, %name, "member address bound");
        Ok(member)
    }

    /// Enroll a member into a group. Returns `false` if already enrolled.
    pub fn enroll(&self, member_id: MemberId, group_id: GroupId) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let inserted = db.execute(
            "INSERT OR IGNORE INTO enrollments (member_id, group_id) VALUES (?1, ?2)",
            params![member_id.0, group_id.0],
        )?;
        if inserted > 0 {
            info!(member_id = %member_id, group_id = %group_id, "member enrolled");
        }
        Ok(inserted > 0)
    }

    /// Everyone enrolled in `group_id`, with their reachability.
    pub fn roster(&self, group_id: GroupId) -> Result<Vec<Recipient>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT m.name, m.address FROM members m
             JOIN enrollments e ON e.member_id = m.id
             WHERE e.group_id = ?1
             ORDER BY m.name COLLATE NOCASE ASC",
        )?;
        let rows = stmt.query_map(params![group_id.0], |row| {
            Ok(Recipient {
                name: row.get(0)?,
                address: row.get(1)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // --- assignments -------------------------------------------------------

    /// Persist a new assignment, stamping its creation instant.
    pub fn create_assignment(
        &self,
        group_id: GroupId,
        title: &str,
        description: Option<&str>,
        due_at: DateTime<Utc>,
    ) -> Result<Assignment> {
        let created_at = Utc::now();
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO assignments (group_id, title, description, due_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                group_id.0,
                title,
                description,
                due_at.to_rfc3339(),
                created_at.to_rfc3339()
            ],
        )?;
        let id = db.last_insert_rowid();
        info!(assignment_id = id, group_id = %group_id, %title, "assignment created");
        Ok(Assignment {
            id: AssignmentId(id),
            group_id,
            title: title.to_string(),
            description: description.map(String::from),
            due_at,
            created_at,
        })
    }

    /// Fetch an assignment by id, `None` if it no longer exists.
    pub fn assignment(&self, id: AssignmentId) -> Result<Option<Assignment>> {
        let db = self.db.lock().unwrap();
        optional(db.query_row(
            "SELECT id, group_id, title, description, due_at, created_at
             FROM assignments WHERE id = ?1",
            params![id.0],
            row_to_assignment,
        ))
    }

    /// All assignments joined with their group, nearest deadline first.
    pub fn list_assignments(&self) -> Result<Vec<AssignmentOverview>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT a.id, a.group_id, a.title, a.description, a.due_at, a.created_at,
                    g.name, g.timezone
             FROM assignments a JOIN groups g ON g.id = a.group_id
             ORDER BY a.due_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AssignmentOverview {
                assignment: row_to_assignment(row)?,
                group_name: row.get(6)?,
                timezone: row.get(7)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Delete assignments whose deadline is at or before `cutoff`.
    ///
    /// Reminder jobs go with them via the FK cascade. Returns the purged
    /// titles so the caller can log what disappeared.
    pub fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let cutoff_str = cutoff.to_rfc3339();
        let db = self.db.lock().unwrap();
        let titles: Vec<String> = {
            let mut stmt = db.prepare("SELECT title FROM assignments WHERE due_at <= ?1")?;
            let rows = stmt.query_map(params![cutoff_str], |row| row.get(0))?;
            rows.filter_map(|r| r.ok()).collect()
        };
        if !titles.is_empty() {
            db.execute(
                "DELETE FROM assignments WHERE due_at <= ?1",
                params![cutoff_str],
            )?;
            info!(count = titles.len(), "expired assignments purged");
        }
        Ok(titles)
    }

    // --- reminder jobs -----------------------------------------------------

    /// Insert a reminder job unless the (assignment, fire_at, label) triple
    /// already exists. Returns `true` when a row was actually written.
    pub fn insert_job_if_absent(
        &self,
        assignment_id: AssignmentId,
        fire_at: DateTime<Utc>,
        label: &str,
    ) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let inserted = db.execute(
            "INSERT OR IGNORE INTO reminder_jobs (assignment_id, fire_at, label)
             VALUES (?1, ?2, ?3)",
            params![assignment_id.0, fire_at.to_rfc3339(), label],
        )?;
        Ok(inserted > 0)
    }

    /// All persisted jobs for one assignment, earliest first.
    pub fn jobs_for_assignment(&self, assignment_id: AssignmentId) -> Result<Vec<ReminderJob>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, assignment_id, fire_at, label FROM reminder_jobs
             WHERE assignment_id = ?1 ORDER BY fire_at ASC",
        )?;
        let rows = stmt.query_map(params![assignment_id.0], row_to_job)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Jobs whose fire instant is strictly after `now` — the rehydration set.
    ///
    /// Rows already in the past are deliberately not returned: reminders
    /// missed while the process was down are dropped, never fired late.
    pub fn future_jobs(&self, now: DateTime<Utc>) -> Result<Vec<ReminderJob>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, assignment_id, fire_at, label FROM reminder_jobs
             WHERE fire_at > ?1 ORDER BY fire_at ASC",
        )?;
        let rows = stmt.query_map(params![now.to_rfc3339()], row_to_job)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

// --- row mapping ------------------------------------------------------------

/// Turn a `QueryReturnedNoRows` into `None` instead of an error.
fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StoreError::Database(e)),
    }
}

fn row_to_group(row: &rusqlite::Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: GroupId(row.get(0)?),
        name: row.get(1)?,
        owner_address: row.get(2)?,
        timezone: row.get(3)?,
    })
}

fn row_to_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<Member> {
    Ok(Member {
        id: MemberId(row.get(0)?),
        name: row.get(1)?,
        handle: row.get(2)?,
        address: row.get(3)?,
    })
}

fn row_to_assignment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: AssignmentId(row.get(0)?),
        group_id: GroupId(row.get(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        due_at: parse_ts(row.get(4)?, 4)?,
        created_at: parse_ts(row.get(5)?, 5)?,
    })
}

fn row_to_job(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReminderJob> {
    Ok(ReminderJob {
        id: row.get(0)?,
        assignment_id: AssignmentId(row.get(1)?),
        fire_at: parse_ts(row.get(2)?, 2)?,
        label: row.get(3)?,
    })
}

/// Parse a stored RFC 3339 timestamp back to a UTC instant.
fn parse_ts(raw: String, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn mem_store() -> Store {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        Store::new(conn).unwrap()
    }

    #[test]
    fn group_names_are_unique() {
        let store = mem_store();
        store.create_group("RoboticsA", "t:1", "Europe/Moscow").unwrap();
        let dup = store.create_group("RoboticsA", "t:2", "UTC");
        assert!(matches!(dup, Err(StoreError::GroupExists(_))));
    }

    #[test]
    fn bad_timezone_is_rejected_at_creation() {
        let store = mem_store();
        let result = store.create_group("RoboticsB", "t:1", "Mars/Olympus_Mons");
        assert!(matches!(result, Err(StoreError::InvalidTimezone(_))));
        assert!(store.group_by_name("RoboticsB").unwrap().is_none());
    }

    #[test]
    fn member_upsert_updates_handle_and_keeps_address() {
        let store = mem_store();
        let first = store.upsert_member("alice", Some("@alice_old")).unwrap();
        assert_eq!(first.handle.as_deref(), Some("alice_old"));

        store.bind_member_address("alice", "chat:42").unwrap();
        let second = store.upsert_member("alice", Some("alice_new")).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.handle.as_deref(), Some("alice_new"));
        assert_eq!(second.address.as_deref(), Some("chat:42"));
    }

    #[test]
    fn binding_address_of_unknown_member_fails() {
        let store = mem_store();
        let result = store.bind_member_address("nobody", "chat:1");
        assert!(matches!(result, Err(StoreError::MemberNotFound(_))));
    }

    #[test]
    fn enrollment_is_idempotent() {
        let store = mem_store();
        let group = store.create_group("RoboticsA", "t:1", "UTC").unwrap();
        let member = store.upsert_member("alice", None).unwrap();
        assert!(store.enroll(member.id, group.id).unwrap());
        assert!(!store.enroll(member.id, group.id).unwrap());
        assert_eq!(store.roster(group.id).unwrap().len(), 1);
    }

    #[test]
    fn job_triple_is_unique() {
        let store = mem_store();
        let group = store.create_group("RoboticsA", "t:1", "UTC").unwrap();
        let due = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
        let assignment = store
            .create_assignment(group.id, "Blink LED", None, due)
            .unwrap();

        assert!(store.insert_job_if_absent(assignment.id, due, "T0").unwrap());
        assert!(!store.insert_job_if_absent(assignment.id, due, "T0").unwrap());
        // same instant, different label — distinct job
        assert!(store
            .insert_job_if_absent(assignment.id, due, "T-15m")
            .unwrap());
        assert_eq!(store.jobs_for_assignment(assignment.id).unwrap().len(), 2);
    }

    #[test]
    fn future_jobs_excludes_the_past() {
        let store = mem_store();
        let group = store.create_group("RoboticsA", "t:1", "UTC").unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 25, 12, 0, 0).unwrap();
        let assignment = store
            .create_assignment(group.id, "Blink LED", None, now + Duration::hours(6))
            .unwrap();

        store
            .insert_job_if_absent(assignment.id, now - Duration::minutes(1), "T-24h")
            .unwrap();
        store
            .insert_job_if_absent(assignment.id, now + Duration::hours(3), "T-3h")
            .unwrap();

        let future = store.future_jobs(now).unwrap();
        assert_eq!(future.len(), 1);
        assert_eq!(future[0].label, "T-3h");
    }

    #[test]
    fn purge_cascades_to_jobs() {
        let store = mem_store();
        let group = store.create_group("RoboticsA", "t:1", "UTC").unwrap();
        let now = Utc::now();
        let old = store
            .create_assignment(group.id, "Old homework", None, now - Duration::days(10))
            .unwrap();
        let fresh = store
            .create_assignment(group.id, "New homework", None, now + Duration::days(1))
            .unwrap();
        store
            .insert_job_if_absent(old.id, now - Duration::days(10), "T0")
            .unwrap();

        let purged = store.purge_expired(now - Duration::days(7)).unwrap();
        assert_eq!(purged, vec!["Old homework".to_string()]);
        assert!(store.assignment(old.id).unwrap().is_none());
        assert!(store.assignment(fresh.id).unwrap().is_some());
        assert!(store.jobs_for_assignment(old.id).unwrap().is_empty());
    }

    #[test]
    fn assignment_overview_carries_group_context() {
        let store = mem_store();
        let group = store
            .create_group("RoboticsA", "t:1", "Europe/Moscow")
            .unwrap();
        let due = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
        store
            .create_assignment(group.id, "Blink LED", Some("PWM on pin 2"), due)
            .unwrap();

        let listed = store.list_assignments().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].group_name, "RoboticsA");
        assert_eq!(listed[0].timezone, "Europe/Moscow");
        assert_eq!(listed[0].assignment.due_at, due);
    }
}
