//! Request-time identity

use crate::access_control::{Permission, PermissionSet};
use serde::Serialize;

/// An authenticated principal with its resolved permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Names of the groups this identity belongs to
    pub groups: Vec<String>,
    /// Effective permissions: direct grants plus every group's grants
    pub permissions: PermissionSet,
}

impl Identity {
    /// Inactive identities hold nothing; active superusers hold everything.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_active && (self.is_superuser || self.permissions.contains(permission))
    }
}
