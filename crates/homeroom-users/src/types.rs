use serde::{Deserialize, Serialize};

use homeroom_core::types::UserRole;

/// A provisioned account.
///
/// `id` is the external transport's numeric user id — accounts are created
/// by an administrator for known people, so there is no autoincrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub name: Option<String>,
    pub role: UserRole,
    /// Deactivated accounts keep their row but are denied every operation.
    pub active: bool,
}
