//! Access control types
//!
//! Core types used by the access control system.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Atomic capability scoped to the Book resource type
///
/// The four permissions are created by the schema migration and never change;
/// only their assignment to groups and identities does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "can_view_book")]
    ViewBook,
    #[serde(rename = "can_create_book")]
    CreateBook,
    #[serde(rename = "can_edit_book")]
    EditBook,
    #[serde(rename = "can_delete_book")]
    DeleteBook,
}

impl Permission {
    /// Get the codename stored in the permission registry
    pub const fn codename(&self) -> &'static str {
        match self {
            Permission::ViewBook => "can_view_book",
            Permission::CreateBook => "can_create_book",
            Permission::EditBook => "can_edit_book",
            Permission::DeleteBook => "can_delete_book",
        }
    }

    /// Human-readable label
    pub const fn label(&self) -> &'static str {
        match self {
            Permission::ViewBook => "Can view book",
            Permission::CreateBook => "Can create book",
            Permission::EditBook => "Can edit book",
            Permission::DeleteBook => "Can delete book",
        }
    }

    /// Try to parse a permission from its codename
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "can_view_book" => Some(Permission::ViewBook),
            "can_create_book" => Some(Permission::CreateBook),
            "can_edit_book" => Some(Permission::EditBook),
            "can_delete_book" => Some(Permission::DeleteBook),
            _ => None,
        }
    }

    /// Get all permissions
    pub fn all() -> &'static [Permission] {
        &[
            Permission::ViewBook,
            Permission::CreateBook,
            Permission::EditBook,
            Permission::DeleteBook,
        ]
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

/// Operation on the Book resource, each gated by exactly one permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookOperation {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl BookOperation {
    /// Permission the caller must hold to perform this operation
    pub const fn required_permission(&self) -> Permission {
        match self {
            BookOperation::List | BookOperation::Retrieve => Permission::ViewBook,
            BookOperation::Create => Permission::CreateBook,
            BookOperation::Update | BookOperation::PartialUpdate => Permission::EditBook,
            BookOperation::Delete => Permission::DeleteBook,
        }
    }

    /// Check if this operation is read-only
    pub const fn is_read_only(&self) -> bool {
        matches!(self, BookOperation::List | BookOperation::Retrieve)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            BookOperation::List => "list_books",
            BookOperation::Retrieve => "retrieve_book",
            BookOperation::Create => "create_book",
            BookOperation::Update => "update_book",
            BookOperation::PartialUpdate => "partial_update_book",
            BookOperation::Delete => "delete_book",
        }
    }

    pub fn all() -> &'static [BookOperation] {
        &[
            BookOperation::List,
            BookOperation::Retrieve,
            BookOperation::Create,
            BookOperation::Update,
            BookOperation::PartialUpdate,
            BookOperation::Delete,
        ]
    }
}

impl fmt::Display for BookOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of permissions held by a group or an identity
///
/// Sets only ever combine by union; there is no subtraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    /// Add every permission of `other` to this set
    pub fn union_with(&mut self, other: &PermissionSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Permission; N]> for PermissionSet {
    fn from(permissions: [Permission; N]) -> Self {
        permissions.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_codename_roundtrip() {
        for permission in Permission::all() {
            let parsed = Permission::try_parse(permission.codename()).unwrap();
            assert_eq!(*permission, parsed);
        }
        assert_eq!(Permission::try_parse("can_fly"), None);
    }

    #[test]
    fn test_permission_serde_uses_codename() {
        let json = serde_json::to_string(&Permission::EditBook).unwrap();
        assert_eq!(json, r#""can_edit_book""#);
    }

    #[test]
    fn test_operation_required_permission() {
        assert_eq!(
            BookOperation::List.required_permission(),
            Permission::ViewBook
        );
        assert_eq!(
            BookOperation::Retrieve.required_permission(),
            Permission::ViewBook
        );
        assert_eq!(
            BookOperation::Create.required_permission(),
            Permission::CreateBook
        );
        assert_eq!(
            BookOperation::Update.required_permission(),
            Permission::EditBook
        );
        assert_eq!(
            BookOperation::PartialUpdate.required_permission(),
            Permission::EditBook
        );
        assert_eq!(
            BookOperation::Delete.required_permission(),
            Permission::DeleteBook
        );
    }

    #[test]
    fn test_operation_read_only() {
        assert!(BookOperation::List.is_read_only());
        assert!(BookOperation::Retrieve.is_read_only());
        assert!(!BookOperation::Create.is_read_only());
        assert!(!BookOperation::Delete.is_read_only());
    }

    #[test]
    fn test_permission_set_union() {
        let mut set = PermissionSet::from([Permission::ViewBook]);
        set.union_with(&PermissionSet::from([
            Permission::ViewBook,
            Permission::CreateBook,
        ]));
        assert_eq!(set.len(), 2);
        assert!(set.contains(Permission::CreateBook));
        assert!(!set.contains(Permission::DeleteBook));
    }
}
