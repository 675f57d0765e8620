use std::str::FromStr;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use tracing::info;

use homeroom_core::types::UserRole;

use crate::db::init_db;
use crate::error::{Result, UserError};
use crate::types::UserAccount;

/// Thread-safe manager for provisioned accounts.
pub struct UserDirectory {
    db: Mutex<Connection>,
}

impl UserDirectory {
    /// Wrap an open connection, initialising the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Create or update an account (upsert on the external id).
    pub fn upsert_account(
        &self,
        id: i64,
        name: Option<&str>,
        role: UserRole,
        active: bool,
    ) -> Result<UserAccount> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO users (id, name, role, active) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, role = excluded.role, active = excluded.active",
            params![id, name, role.to_string(), active as i64],
        )?;
        info!(user_id = id, %role, active, "account upserted");
        Ok(UserAccount {
            id,
            name: name.map(String::from),
            role,
            active,
        })
    }

    /// Fetch an account, `None` if never provisioned.
    pub fn account(&self, id: i64) -> Result<Option<UserAccount>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT id, name, role, active FROM users WHERE id = ?1",
            params![id],
            row_to_account,
        ) {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(UserError::Database(e)),
        }
    }

    /// Flip the activation flag.
    pub fn set_active(&self, id: i64, active: bool) -> Result<()> {
        let db = self.db.lock().unwrap();
        let changed = db.execute(
            "UPDATE users SET active = ?1 WHERE id = ?2",
            params![active as i64, id],
        )?;
        if changed == 0 {
            return Err(UserError::NotFound(id));
        }
        info!(user_id = id, active, "account activation changed");
        Ok(())
    }

    /// Return the account if it exists and is active, erroring otherwise.
    pub fn ensure_active(&self, id: i64) -> Result<UserAccount> {
        match self.account(id)? {
            None => Err(UserError::NotFound(id)),
            Some(account) if !account.active => Err(UserError::NotActive(id)),
            Some(account) => Ok(account),
        }
    }

    pub fn is_global_admin(&self, id: i64) -> Result<bool> {
        Ok(self
            .account(id)?
            .map(|a| a.active && a.role.is_global_admin())
            .unwrap_or(false))
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserAccount> {
    let role = UserRole::from_str(&row.get::<_, String>(2)?).unwrap_or_default();
    Ok(UserAccount {
        id: row.get(0)?,
        name: row.get(1)?,
        role,
        active: row.get::<_, i64>(3)? != 0,
    })
}
