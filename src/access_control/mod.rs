//! Access control module
//!
//! Group-based permission checks for the Book resource.
//!
//! ## Access Control Model
//!
//! ```text
//! identity → groups → permissions → operation gate
//! ```
//!
//! | Operation               | Required permission |
//! |-------------------------|---------------------|
//! | list / retrieve         | `can_view_book`     |
//! | create                  | `can_create_book`   |
//! | update / partial update | `can_edit_book`     |
//! | delete                  | `can_delete_book`   |
//!
//! An identity's effective permissions are the union of its direct grants and
//! the grants of every group it belongs to. There are no per-row permissions:
//! every Book shares the same four gates.

pub mod resolver;
pub mod types;

pub use resolver::{AccessDecision, check, check_permission, effective_permissions, require};
pub use types::{BookOperation, Permission, PermissionSet};
