use rusqlite::{Connection, Result};

/// Initialise the users table. Idempotent — safe on every startup.
pub fn init_db(conn: &Connection) -> Result<()> {
    // id is the external transport's user id — provisioned, not generated.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id      INTEGER PRIMARY KEY,
            name    TEXT,
            role    TEXT    NOT NULL DEFAULT 'user',
            active  INTEGER NOT NULL DEFAULT 0
        );",
    )
}
