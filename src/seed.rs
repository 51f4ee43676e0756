//! Bootstrap seeding
//!
//! Two idempotent setup routines, run once per deployment after migrations:
//! - [`seed_groups`] creates the Viewers / Editors / Admins groups and their grants
//! - [`seed_demo_users`] creates one demo identity per group
//!
//! Each routine runs in a single transaction and reports what it created
//! versus what already existed.

use crate::access_control::{Permission, PermissionSet};
use crate::auth::manager::create_user;
use crate::error::SeedError;
use crate::store::Store;
use crate::store::{group, identity};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// A group and the permissions it must hold
#[derive(Debug, Clone, Copy)]
pub struct GroupSpec {
    pub name: &'static str,
    pub permissions: &'static [Permission],
}

/// The group table every deployment starts with
pub const DEFAULT_GROUPS: &[GroupSpec] = &[
    GroupSpec {
        name: "Viewers",
        permissions: &[Permission::ViewBook],
    },
    GroupSpec {
        name: "Editors",
        permissions: &[
            Permission::ViewBook,
            Permission::CreateBook,
            Permission::EditBook,
        ],
    },
    GroupSpec {
        name: "Admins",
        permissions: &[
            Permission::ViewBook,
            Permission::CreateBook,
            Permission::EditBook,
            Permission::DeleteBook,
        ],
    },
];

/// A demo identity and the group it joins
#[derive(Debug, Clone, Copy)]
pub struct DemoUser {
    pub email: &'static str,
    pub password: &'static str,
    pub group: &'static str,
}

pub const DEMO_USERS: &[DemoUser] = &[
    DemoUser {
        email: "viewer@example.com",
        password: "testpass123",
        group: "Viewers",
    },
    DemoUser {
        email: "editor@example.com",
        password: "testpass123",
        group: "Editors",
    },
    DemoUser {
        email: "admin@example.com",
        password: "testpass123",
        group: "Admins",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStatus {
    Created,
    AlreadyExists,
}

impl SeedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedStatus::Created => "created",
            SeedStatus::AlreadyExists => "already exists",
        }
    }
}

impl fmt::Display for SeedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What seeding did for one group or identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOutcome {
    pub name: String,
    pub status: SeedStatus,
    /// Grants or memberships added by this run
    pub added: Vec<String>,
}

/// Per-entry outcomes of a seeding run, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub outcomes: Vec<SeedOutcome>,
}

impl SeedReport {
    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SeedStatus::Created)
            .count()
    }

    pub fn get(&self, name: &str) -> Option<&SeedOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    /// True when the run changed nothing
    pub fn is_noop(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == SeedStatus::AlreadyExists && o.added.is_empty())
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            write!(f, "{:<24} {}", outcome.name, outcome.status)?;
            if !outcome.added.is_empty() {
                write!(f, " (added: {})", outcome.added.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Ensure [`DEFAULT_GROUPS`] exist with their grants
pub async fn seed_groups(store: &Store) -> Result<SeedReport, SeedError> {
    seed_group_table(store, DEFAULT_GROUPS).await
}

/// Ensure each group in `table` exists holding at least its listed grants
///
/// Every permission is resolved before anything is written, so a missing
/// registry entry aborts with the database untouched. Existing grants are
/// never removed.
pub async fn seed_group_table(
    store: &Store,
    table: &[GroupSpec],
) -> Result<SeedReport, SeedError> {
    let mut tx = store.begin().await?;

    let mut permission_ids = BTreeMap::new();
    for permission in Permission::all() {
        let Some(id) = group::permission_id(&mut tx, *permission).await? else {
            return Err(SeedError::MissingPermission {
                codename: permission.codename(),
            });
        };
        permission_ids.insert(*permission, id);
    }

    let mut report = SeedReport::default();
    for spec in table {
        let (group_id, status) = match group::find_by_name(&mut tx, spec.name).await? {
            Some(id) => (id, SeedStatus::AlreadyExists),
            None => (group::insert(&mut tx, spec.name).await?, SeedStatus::Created),
        };

        let mut added = Vec::new();
        for permission in spec.permissions {
            let Some(&permission_id) = permission_ids.get(permission) else {
                return Err(SeedError::MissingPermission {
                    codename: permission.codename(),
                });
            };
            if group::grant(&mut tx, group_id, permission_id).await? {
                added.push(permission.codename().to_string());
            }
        }

        debug!(group = spec.name, %status, added = added.len(), "Seeded group");
        report.outcomes.push(SeedOutcome {
            name: spec.name.to_string(),
            status,
            added,
        });
    }

    tx.commit().await?;
    info!(created = report.created(), "Group seeding complete");
    Ok(report)
}

/// Ensure each of [`DEMO_USERS`] exists and belongs to its group
///
/// Requires [`seed_groups`] to have run. Existing identities keep their
/// password.
pub async fn seed_demo_users(store: &Store, pepper: Option<&str>) -> Result<SeedReport, SeedError> {
    let mut tx = store.begin().await?;

    let mut group_ids = BTreeMap::new();
    for user in DEMO_USERS {
        let Some(id) = group::find_by_name(&mut tx, user.group).await? else {
            return Err(SeedError::MissingGroup {
                name: user.group.to_string(),
            });
        };
        group_ids.insert(user.group, id);
    }

    let mut report = SeedReport::default();
    for user in DEMO_USERS {
        let (identity_id, status) = match identity::find_by_email(&mut tx, user.email).await? {
            Some(record) => (record.id, SeedStatus::AlreadyExists),
            None => {
                let created = create_user(&mut tx, user.email, user.password, pepper).await?;
                (created.id, SeedStatus::Created)
            }
        };

        let Some(&group_id) = group_ids.get(user.group) else {
            return Err(SeedError::MissingGroup {
                name: user.group.to_string(),
            });
        };

        let mut added = Vec::new();
        if identity::add_to_group(&mut tx, identity_id, group_id).await? {
            added.push(user.group.to_string());
        }

        report.outcomes.push(SeedOutcome {
            name: user.email.to_string(),
            status,
            added,
        });
    }

    tx.commit().await?;
    info!(created = report.created(), "Demo identity seeding complete");
    Ok(report)
}

/// The permissions a seeded group is expected to hold
pub fn expected_permissions(name: &str) -> Option<PermissionSet> {
    DEFAULT_GROUPS
        .iter()
        .find(|spec| spec.name == name)
        .map(|spec| spec.permissions.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_table_is_nested() {
        let viewers = expected_permissions("Viewers").unwrap();
        let editors = expected_permissions("Editors").unwrap();
        let admins = expected_permissions("Admins").unwrap();

        assert_eq!(viewers.len(), 1);
        assert_eq!(editors.len(), 3);
        assert_eq!(admins.len(), 4);
        assert!(viewers.iter().all(|p| editors.contains(p)));
        assert!(editors.iter().all(|p| admins.contains(p)));
        assert!(!editors.contains(Permission::DeleteBook));
        assert!(expected_permissions("Nobody").is_none());
    }

    #[test]
    fn test_demo_users_reference_seeded_groups() {
        for user in DEMO_USERS {
            assert!(expected_permissions(user.group).is_some(), "{}", user.group);
        }
    }

    #[test]
    fn test_report_display() {
        let report = SeedReport {
            outcomes: vec![
                SeedOutcome {
                    name: "Viewers".to_string(),
                    status: SeedStatus::Created,
                    added: vec!["can_view_book".to_string()],
                },
                SeedOutcome {
                    name: "Editors".to_string(),
                    status: SeedStatus::AlreadyExists,
                    added: Vec::new(),
                },
            ],
        };
        let text = report.to_string();
        assert!(text.contains("Viewers"));
        assert!(text.contains("created (added: can_view_book)"));
        assert!(text.contains("already exists"));
        assert_eq!(report.created(), 1);
        assert!(!report.is_noop());
    }
}
