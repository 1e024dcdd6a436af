//! Role-based access control
//!
//! Two roles, one rule: admins see everything, everyone else sees what they
//! created.

use crate::types::{Role, UserId, UserProfile};
use serde::Serialize;

/// Authenticated caller on whose behalf storage is queried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    /// Caller's user id
    pub user_id: UserId,
    /// Caller's role
    pub role: Role,
}

impl Actor {
    /// Create new actor
    #[inline]
    #[must_use]
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Admin actor
    #[inline]
    #[must_use]
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Regular actor
    #[inline]
    #[must_use]
    pub fn user(user_id: UserId) -> Self {
        Self::new(user_id, Role::User)
    }

    /// Whether the actor bypasses ownership checks
    #[inline]
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the actor may touch a record owned by `owner`
    #[inline]
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        can_access(self.user_id, owner, self.is_admin())
    }

    /// Owner filter to apply to queries; `None` means unrestricted
    #[inline]
    #[must_use]
    pub fn owner_filter(&self) -> Option<UserId> {
        if self.is_admin() {
            None
        } else {
            Some(self.user_id)
        }
    }

    /// Check a permission for this actor's role
    #[inline]
    #[must_use]
    pub fn has(&self, permission: Permission) -> bool {
        Permissions::for_role(self.role).allows(permission)
    }
}

impl From<&UserProfile> for Actor {
    fn from(profile: &UserProfile) -> Self {
        Self::new(profile.id, profile.role)
    }
}

/// Ownership rule
#[inline]
#[must_use]
pub fn can_access(user_id: UserId, owner: UserId, is_admin: bool) -> bool {
    is_admin || user_id == owner
}

/// Individual capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnResources,
    CreateResources,
    UpdateOwnResources,
    DeleteOwnResources,
    ViewAllResources,
    UpdateAllResources,
    DeleteAllResources,
    ManageUsers,
}

/// Capability table for a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub can_view_own_resources: bool,
    pub can_create_resources: bool,
    pub can_update_own_resources: bool,
    pub can_delete_own_resources: bool,
    pub can_view_all_resources: bool,
    pub can_update_all_resources: bool,
    pub can_delete_all_resources: bool,
    pub can_manage_users: bool,
}

impl Permissions {
    /// Capabilities granted to `role`
    #[must_use]
    pub fn for_role(role: Role) -> Self {
        let base = Self {
            can_view_own_resources: true,
            can_create_resources: true,
            can_update_own_resources: true,
            can_delete_own_resources: true,
            ..Self::default()
        };

        match role {
            Role::Admin => Self {
                can_view_all_resources: true,
                can_update_all_resources: true,
                can_delete_all_resources: true,
                can_manage_users: true,
                ..base
            },
            Role::User => base,
        }
    }

    /// Check a single capability
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ViewOwnResources => self.can_view_own_resources,
            Permission::CreateResources => self.can_create_resources,
            Permission::UpdateOwnResources => self.can_update_own_resources,
            Permission::DeleteOwnResources => self.can_delete_own_resources,
            Permission::ViewAllResources => self.can_view_all_resources,
            Permission::UpdateAllResources => self.can_update_all_resources,
            Permission::DeleteAllResources => self.can_delete_all_resources,
            Permission::ManageUsers => self.can_manage_users,
        }
    }
}
