use rusqlite::{Connection, Result};

/// Initialise all store tables. Safe to call on every startup —
/// CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_groups_table(conn)?;
    create_members_table(conn)?;
    create_enrollments_table(conn)?;
    create_assignments_table(conn)?;
    create_reminder_jobs_table(conn)?;
    Ok(())
}

fn create_groups_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS groups (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT    NOT NULL UNIQUE,
            owner_address   TEXT    NOT NULL,
            timezone        TEXT    NOT NULL
        );",
    )
}

fn create_members_table(conn: &Connection) -> Result<()> {
    // address is NULL until the member's chat is bound; such members are
    // unreachable and show up in the owner's delivery summary.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS members (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT    NOT NULL UNIQUE,
            handle      TEXT,
            address     TEXT
        );",
    )
}

fn create_enrollments_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS enrollments (
            member_id   INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            group_id    INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            UNIQUE (member_id, group_id)
        );
        CREATE INDEX IF NOT EXISTS idx_enrollments_member ON enrollments(member_id);
        CREATE INDEX IF NOT EXISTS idx_enrollments_group  ON enrollments(group_id);",
    )
}

fn create_assignments_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS assignments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id    INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            title       TEXT    NOT NULL,
            description TEXT,
            due_at      TEXT    NOT NULL,   -- RFC 3339 UTC
            created_at  TEXT    NOT NULL    -- RFC 3339 UTC
        );
        CREATE INDEX IF NOT EXISTS idx_assignments_group ON assignments(group_id);",
    )
}

fn create_reminder_jobs_table(conn: &Connection) -> Result<()> {
    // The (assignment_id, fire_at, label) uniqueness is what makes
    // re-computation idempotent: INSERT OR IGNORE against this constraint
    // is the store-level dedup the scheduler relies on.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS reminder_jobs (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            assignment_id   INTEGER NOT NULL REFERENCES assignments(id) ON DELETE CASCADE,
            fire_at         TEXT    NOT NULL,   -- RFC 3339 UTC
            label           TEXT    NOT NULL,
            UNIQUE (assignment_id, fire_at, label)
        );
        CREATE INDEX IF NOT EXISTS idx_reminder_jobs_assignment ON reminder_jobs(assignment_id);

        -- Efficient rehydration: SELECT … WHERE fire_at > ?
        CREATE INDEX IF NOT EXISTS idx_reminder_jobs_fire_at ON reminder_jobs(fire_at);",
    )
}
