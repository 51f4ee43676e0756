//! Identity management
//!
//! Creating identities, checking credentials, issuing tokens and the
//! administrative mutations (activation, group membership, direct grants).
//! Identities are deactivated, never deleted.

use crate::access_control::Permission;
use crate::auth::Identity;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::generate_token;
use crate::error::{AuthError, FieldErrors, StoreError};
use crate::store::identity::{self, IdentityRecord, NewIdentity};
use crate::store::{group, token};
use regex::Regex;
use sqlx::SqliteConnection;
use std::sync::LazyLock;
use tracing::{debug, info};

static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_ok_and(|pattern| pattern.is_match(email))
}

/// Kind of identity to create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Regular,
    /// Staff with every permission implied
    Superuser,
}

/// Trim and lower-case the domain part of an address
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn validate_account_input(email: &str, password: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if email.is_empty() {
        errors.add("email", "The Email field must be set.");
    } else if !is_valid_email(email) {
        errors.add("email", "Enter a valid email address.");
    }
    if password.is_empty() {
        errors.add("password", "This field may not be blank.");
    }
    errors.into_result()
}

/// Create a regular identity or a superuser
pub async fn create_account(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
    kind: AccountKind,
    pepper: Option<&str>,
) -> Result<Identity, AuthError> {
    let email = normalize_email(email);
    validate_account_input(&email, password).map_err(AuthError::Validation)?;

    let password_hash = hash_password(password, pepper)?;
    let superuser = kind == AccountKind::Superuser;

    let id = identity::insert(
        conn,
        &NewIdentity {
            email: &email,
            password_hash: &password_hash,
            is_staff: superuser,
            is_superuser: superuser,
        },
    )
    .await
    .map_err(|e| match e {
        StoreError::Duplicate { .. } => AuthError::Validation(FieldErrors::single(
            "email",
            "An identity with that email already exists.",
        )),
        other => AuthError::Store(other),
    })?;

    info!(identity = %email, superuser, "Created identity");
    load(conn, id).await
}

/// Create a regular, active identity
pub async fn create_user(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
    pepper: Option<&str>,
) -> Result<Identity, AuthError> {
    create_account(conn, email, password, AccountKind::Regular, pepper).await
}

/// Create an active superuser
pub async fn create_superuser(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
    pepper: Option<&str>,
) -> Result<Identity, AuthError> {
    create_account(conn, email, password, AccountKind::Superuser, pepper).await
}

/// Check credentials for an active identity
pub async fn authenticate(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
    pepper: Option<&str>,
) -> Result<Identity, AuthError> {
    let email = normalize_email(email);
    let Some(record) = identity::find_by_email(conn, &email).await? else {
        // Spend the same hashing time as a real check
        let _ = hash_password(password, pepper);
        debug!(identity = %email, "Login for unknown identity");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &record.password_hash, pepper)? || !record.is_active {
        debug!(identity = %email, "Login rejected");
        return Err(AuthError::InvalidCredentials);
    }

    Ok(identity::load_identity(conn, record).await?)
}

/// The identity's token, creating one on first use
pub async fn obtain_token(
    conn: &mut SqliteConnection,
    identity_id: i64,
) -> Result<String, AuthError> {
    if let Some(key) = token::find_for_identity(conn, identity_id).await? {
        return Ok(key);
    }

    let key = generate_token();
    token::insert(conn, &key, identity_id).await?;
    Ok(key)
}

/// Resolve a token to an active identity
pub async fn identity_for_token(
    conn: &mut SqliteConnection,
    key: &str,
) -> Result<Identity, AuthError> {
    let Some(id) = token::identity_for(conn, key).await? else {
        return Err(AuthError::InvalidToken);
    };

    let identity = load(conn, id).await?;
    if !identity.is_active {
        return Err(AuthError::InvalidToken);
    }
    Ok(identity)
}

/// Activate or deactivate an identity by email
pub async fn set_active(
    conn: &mut SqliteConnection,
    email: &str,
    active: bool,
) -> Result<(), AuthError> {
    let record = find(conn, email).await?;
    identity::set_active(conn, record.id, active).await?;
    info!(identity = %record.email, active, "Updated identity status");
    Ok(())
}

/// Add an identity to a named group; `false` if already a member
pub async fn add_to_group(
    conn: &mut SqliteConnection,
    email: &str,
    group_name: &str,
) -> Result<bool, AuthError> {
    let record = find(conn, email).await?;
    let Some(group_id) = group::find_by_name(conn, group_name).await? else {
        return Err(AuthError::Validation(FieldErrors::single(
            "group",
            format!("Group '{}' does not exist.", group_name),
        )));
    };

    let added = identity::add_to_group(conn, record.id, group_id).await?;
    info!(identity = %record.email, group = group_name, added, "Assigned group");
    Ok(added)
}

/// Grant a permission directly; `false` if already granted
pub async fn grant_permission(
    conn: &mut SqliteConnection,
    email: &str,
    permission: Permission,
) -> Result<bool, AuthError> {
    let record = find(conn, email).await?;
    let Some(permission_id) = group::permission_id(conn, permission).await? else {
        return Err(AuthError::Validation(FieldErrors::single(
            "permission",
            format!("Permission '{}' is not registered.", permission),
        )));
    };

    let granted = identity::grant_permission(conn, record.id, permission_id).await?;
    info!(identity = %record.email, permission = %permission, granted, "Granted permission");
    Ok(granted)
}

async fn find(conn: &mut SqliteConnection, email: &str) -> Result<IdentityRecord, AuthError> {
    let email = normalize_email(email);
    identity::find_by_email(conn, &email)
        .await?
        .ok_or_else(|| AuthError::UnknownIdentity(email.clone()))
}

async fn load(conn: &mut SqliteConnection, id: i64) -> Result<Identity, AuthError> {
    let Some(record) = identity::find_by_id(conn, id).await? else {
        return Err(AuthError::UnknownIdentity(id.to_string()));
    };
    Ok(identity::load_identity(conn, record).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(
            normalize_email("  Viewer@Example.COM "),
            "Viewer@example.com"
        );
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_account_input_validation() {
        assert!(validate_account_input("a@example.com", "pw").is_ok());

        let errors = validate_account_input("", "").unwrap_err();
        assert!(errors.contains("email"));
        assert!(errors.contains("password"));

        let errors = validate_account_input("not-an-email", "pw").unwrap_err();
        assert_eq!(errors.get("email").unwrap()[0], "Enter a valid email address.");
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();

        let user = create_user(&mut conn, "reader@example.com", "s3cret", None)
            .await
            .unwrap();
        assert!(user.is_active);
        assert!(!user.is_superuser);
        assert!(user.permissions.is_empty());

        let logged_in = authenticate(&mut conn, "reader@EXAMPLE.com", "s3cret", None)
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(matches!(
            authenticate(&mut conn, "reader@example.com", "wrong", None).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();

        create_user(&mut conn, "dup@example.com", "pw", None)
            .await
            .unwrap();
        let err = create_user(&mut conn, "dup@EXAMPLE.com", "pw", None)
            .await
            .unwrap_err();
        match err {
            AuthError::Validation(errors) => assert!(errors.contains("email")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_superuser_flags() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();

        let admin = create_superuser(&mut conn, "root@example.com", "pw", None)
            .await
            .unwrap();
        assert!(admin.is_superuser);
        assert!(admin.is_staff);
        assert!(admin.has_permission(Permission::DeleteBook));
    }

    #[tokio::test]
    async fn test_token_is_stable_and_revoked_by_deactivation() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();

        let user = create_user(&mut conn, "t@example.com", "pw", None)
            .await
            .unwrap();
        let first = obtain_token(&mut conn, user.id).await.unwrap();
        let second = obtain_token(&mut conn, user.id).await.unwrap();
        assert_eq!(first, second);

        let resolved = identity_for_token(&mut conn, &first).await.unwrap();
        assert_eq!(resolved.email, "t@example.com");

        set_active(&mut conn, "t@example.com", false).await.unwrap();
        assert!(matches!(
            identity_for_token(&mut conn, &first).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            authenticate(&mut conn, "t@example.com", "pw", None).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_direct_grant_is_effective() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();

        create_user(&mut conn, "g@example.com", "pw", None)
            .await
            .unwrap();
        assert!(
            grant_permission(&mut conn, "g@example.com", Permission::ViewBook)
                .await
                .unwrap()
        );
        assert!(
            !grant_permission(&mut conn, "g@example.com", Permission::ViewBook)
                .await
                .unwrap()
        );

        let user = authenticate(&mut conn, "g@example.com", "pw", None)
            .await
            .unwrap();
        assert!(user.has_permission(Permission::ViewBook));
        assert!(!user.has_permission(Permission::CreateBook));
    }

    #[tokio::test]
    async fn test_unknown_group_rejected() {
        let store = Store::in_memory().await.unwrap();
        let mut conn = store.acquire().await.unwrap();

        create_user(&mut conn, "x@example.com", "pw", None)
            .await
            .unwrap();
        assert!(matches!(
            add_to_group(&mut conn, "x@example.com", "Nobody").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            add_to_group(&mut conn, "missing@example.com", "Viewers").await,
            Err(AuthError::UnknownIdentity(_))
        ));
    }
}
