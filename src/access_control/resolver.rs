//! Access control resolver
//!
//! Resolves an identity's effective permissions and decides whether it may
//! perform a Book operation. Resolution is a plain set union:
//! 1. Permissions granted directly to the identity
//! 2. Permissions of every group the identity belongs to
//!
//! Active superusers hold every permission. Inactive identities hold none.
//! The decision is a pure predicate; nothing is mutated.

use crate::access_control::types::{BookOperation, Permission, PermissionSet};
use crate::auth::Identity;
use crate::error::{AccessDeniedError, ApiError};
use tracing::{debug, trace};

/// Result of access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is allowed
    Allowed,
    /// No identity was presented
    Unauthenticated,
    /// The identity lacks the required permission
    Denied(Permission),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }
}

/// Union of direct grants and the permission sets of every group
pub fn effective_permissions<'a>(
    direct: &PermissionSet,
    groups: impl IntoIterator<Item = &'a PermissionSet>,
) -> PermissionSet {
    let mut effective = direct.clone();
    for group in groups {
        effective.union_with(group);
    }
    effective
}

/// Check whether `identity` holds `permission`
pub fn check_permission(identity: Option<&Identity>, permission: Permission) -> AccessDecision {
    let Some(identity) = identity else {
        trace!(permission = %permission, "No identity presented");
        return AccessDecision::Unauthenticated;
    };

    if identity.has_permission(permission) {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied(permission)
    }
}

/// Check if a Book operation is permitted
pub fn check(identity: Option<&Identity>, operation: BookOperation) -> AccessDecision {
    let permission = operation.required_permission();
    let decision = check_permission(identity, permission);

    debug!(
        operation = %operation,
        permission = %permission,
        read_only = operation.is_read_only(),
        identity = identity.map(|i| i.email.as_str()),
        allowed = decision.is_allowed(),
        "Checking access"
    );

    decision
}

/// Check if a Book operation is permitted, returning an error if not
pub fn require(identity: Option<&Identity>, operation: BookOperation) -> Result<(), ApiError> {
    into_result(check(identity, operation), operation.as_str())
}

/// Like [`require`], for endpoints that reuse a Book permission directly
pub fn require_permission(
    identity: Option<&Identity>,
    permission: Permission,
    operation: &str,
) -> Result<(), ApiError> {
    into_result(check_permission(identity, permission), operation)
}

fn into_result(decision: AccessDecision, operation: &str) -> Result<(), ApiError> {
    match decision {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Unauthenticated => Err(ApiError::not_authenticated()),
        AccessDecision::Denied(missing) => {
            Err(AccessDeniedError::new(operation, missing).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(permissions: PermissionSet) -> Identity {
        Identity {
            id: 1,
            email: "reader@example.com".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            groups: Vec::new(),
            permissions,
        }
    }

    #[test]
    fn test_anonymous_is_unauthenticated() {
        assert_eq!(
            check(None, BookOperation::List),
            AccessDecision::Unauthenticated
        );
        assert!(matches!(
            require(None, BookOperation::Delete),
            Err(ApiError::AuthenticationRequired(_))
        ));
    }

    #[test]
    fn test_missing_permission_is_denied() {
        let viewer = identity(PermissionSet::from([Permission::ViewBook]));
        assert!(check(Some(&viewer), BookOperation::Retrieve).is_allowed());
        assert_eq!(
            check(Some(&viewer), BookOperation::Create),
            AccessDecision::Denied(Permission::CreateBook)
        );
        assert!(matches!(
            require(Some(&viewer), BookOperation::Update),
            Err(ApiError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_inactive_identity_holds_nothing() {
        let mut user = identity(PermissionSet::from([Permission::ViewBook]));
        user.is_active = false;
        assert!(check(Some(&user), BookOperation::List).is_denied());

        user.is_superuser = true;
        assert!(check(Some(&user), BookOperation::List).is_denied());
    }

    #[test]
    fn test_superuser_holds_everything() {
        let mut admin = identity(PermissionSet::new());
        admin.is_superuser = true;
        for operation in BookOperation::all() {
            assert!(check(Some(&admin), *operation).is_allowed());
        }
    }

    #[test]
    fn test_effective_permissions_is_union() {
        let direct = PermissionSet::from([Permission::DeleteBook]);
        let viewers = PermissionSet::from([Permission::ViewBook]);
        let editors = PermissionSet::from([
            Permission::ViewBook,
            Permission::CreateBook,
            Permission::EditBook,
        ]);

        let effective = effective_permissions(&direct, [&viewers, &editors]);
        assert_eq!(effective.len(), 4);

        let only_groups = effective_permissions(&PermissionSet::new(), [&viewers]);
        assert_eq!(only_groups, viewers);
    }
}
