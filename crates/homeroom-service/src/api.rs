//! Permission-checked administrative operations.
//!
//! This is the seam the conversational layer (menus, forms, whatever chat
//! platform) calls into. Each operation names the acting user; authorization
//! happens here so the layers above never need to reason about roles.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use homeroom_core::error::{HomeroomError, Result};
use homeroom_core::types::{GroupId, MemberId, UserRole};
use homeroom_scheduler::ReminderScheduler;
use homeroom_store::{Assignment, AssignmentOverview, Group, Member, Store, StoreError};
use homeroom_users::{Permission, PermissionCheck, PermissionChecker, UserAccount, UserDirectory, UserError};

/// The administrative facade.
pub struct AdminApi {
    store: Store,
    users: Arc<UserDirectory>,
    scheduler: Arc<ReminderScheduler>,
    /// Assignments whose deadline is older than this get purged.
    purge_after: Duration,
}

impl AdminApi {
    pub fn new(
        store: Store,
        users: Arc<UserDirectory>,
        scheduler: Arc<ReminderScheduler>,
        purge_after_hours: u64,
    ) -> Self {
        Self {
            store,
            users,
            scheduler,
            purge_after: Duration::hours(purge_after_hours as i64),
        }
    }

    // --- groups ------------------------------------------------------------

    pub fn create_group(
        &self,
        actor: i64,
        name: &str,
        owner_address: &str,
        timezone: &str,
    ) -> Result<Group> {
        self.authorize(actor, Permission::ManageGroups)?;
        self.store
            .create_group(name, owner_address, timezone)
            .map_err(store_err)
    }

    pub fn list_groups(&self, actor: i64) -> Result<Vec<Group>> {
        self.authorize(actor, Permission::ViewAssignments)?;
        self.store.list_groups().map_err(store_err)
    }

    // --- roster ------------------------------------------------------------

    pub fn add_member(&self, actor: i64, name: &str, handle: Option<&str>) -> Result<Member> {
        self.authorize(actor, Permission::ManageRoster)?;
        self.store.upsert_member(name, handle).map_err(store_err)
    }

    /// Bind a member's chat address ("register chat").
    pub fn bind_member_address(&self, actor: i64, name: &str, address: &str) -> Result<Member> {
        self.authorize(actor, Permission::ManageRoster)?;
        self.store
            .bind_member_address(name, address)
            .map_err(store_err)
    }

    pub fn enroll(&self, actor: i64, member_id: MemberId, group_id: GroupId) -> Result<bool> {
        self.authorize(actor, Permission::ManageRoster)?;
        self.store.enroll(member_id, group_id).map_err(store_err)
    }

    // --- assignments -------------------------------------------------------

    /// Create an assignment and schedule its reminders.
    ///
    /// The assignment row is written first; if reminder persistence then
    /// fails, the assignment stays saved and the caller gets
    /// [`HomeroomError::RemindersIncomplete`] — the one scheduling failure
    /// that must be visible upstream.
    pub fn create_assignment(
        &self,
        actor: i64,
        group_id: GroupId,
        title: &str,
        description: Option<&str>,
        due_at: DateTime<Utc>,
    ) -> Result<Assignment> {
        self.authorize(actor, Permission::AssignHomework)?;
        if self.store.group(group_id).map_err(store_err)?.is_none() {
            return Err(HomeroomError::NotFound(format!("group {group_id}")));
        }

        let assignment = self
            .store
            .create_assignment(group_id, title, description, due_at)
            .map_err(store_err)?;

        if let Err(e) = self.scheduler.schedule_for_assignment(assignment.id) {
            warn!(
                assignment_id = %assignment.id,
                error = %e,
                "assignment saved but reminder scheduling failed"
            );
            return Err(HomeroomError::RemindersIncomplete {
                assignment_id: assignment.id.0,
                reason: e.to_string(),
            });
        }
        Ok(assignment)
    }

    /// List assignments with group context, purging expired ones first.
    pub fn list_assignments(&self, actor: i64) -> Result<Vec<AssignmentOverview>> {
        self.authorize(actor, Permission::ViewAssignments)?;
        let purged = self
            .store
            .purge_expired(Utc::now() - self.purge_after)
            .map_err(store_err)?;
        if !purged.is_empty() {
            info!(titles = ?purged, "purged expired assignments before listing");
        }
        self.store.list_assignments().map_err(store_err)
    }

    // --- accounts ----------------------------------------------------------

    pub fn provision_user(
        &self,
        actor: i64,
        id: i64,
        name: Option<&str>,
        role: UserRole,
        active: bool,
    ) -> Result<UserAccount> {
        self.authorize(actor, Permission::ManageUsers)?;
        self.users
            .upsert_account(id, name, role, active)
            .map_err(user_err)
    }

    pub fn set_user_active(&self, actor: i64, id: i64, active: bool) -> Result<()> {
        self.authorize(actor, Permission::ManageUsers)?;
        self.users.set_active(id, active).map_err(user_err)
    }

    // --- internals ---------------------------------------------------------

    fn authorize(&self, actor: i64, permission: Permission) -> Result<UserAccount> {
        let Some(account) = self.users.account(actor).map_err(user_err)? else {
            return Err(HomeroomError::PermissionDenied {
                reason: format!("unknown user {actor}"),
            });
        };
        match PermissionChecker::check(&account, &permission) {
            PermissionCheck::Allowed => Ok(account),
            PermissionCheck::Denied { reason } => {
                Err(HomeroomError::PermissionDenied { reason })
            }
        }
    }
}

fn store_err(e: StoreError) -> HomeroomError {
    match e {
        StoreError::InvalidTimezone(tz) => HomeroomError::InvalidTimezone(tz),
        StoreError::GroupExists(name) => HomeroomError::AlreadyExists(format!("group {name}")),
        StoreError::MemberNotFound(name) => HomeroomError::NotFound(format!("member {name}")),
        StoreError::Database(e) => HomeroomError::Database(e.to_string()),
    }
}

fn user_err(e: UserError) -> HomeroomError {
    match e {
        UserError::NotFound(id) => HomeroomError::NotFound(format!("user {id}")),
        UserError::NotActive(id) => HomeroomError::PermissionDenied {
            reason: format!("user {id} is not active"),
        },
        UserError::Database(e) => HomeroomError::Database(e.to_string()),
    }
}
