//! Admin account bootstrap

use domain_users::{AdminReset, UserRepository, UserService};
use tracing::{info, warn};

use crate::config::AdminConfig;

/// Create the admin account on start-up when `ADMIN_PASSWORD` is set and the
/// account does not exist yet. An existing admin is left untouched.
pub async fn bootstrap<R: UserRepository>(
    users: &UserService<R>,
    admin: &AdminConfig,
) -> eyre::Result<Option<AdminReset>> {
    let Some(password) = admin.password.as_deref() else {
        info!("ADMIN_PASSWORD not set, skipping admin bootstrap");
        return Ok(None);
    };

    if users.admin_exists(&admin.username).await? {
        info!(username = %admin.username, "Admin user already exists");
        return Ok(None);
    }

    let outcome = users
        .reset_admin(&admin.username, &admin.email, password)
        .await?;
    Ok(Some(outcome))
}

/// Create the admin account, or reset its password and re-activate it
pub async fn reset<R: UserRepository>(
    users: &UserService<R>,
    admin: &AdminConfig,
) -> eyre::Result<AdminReset> {
    let password = admin
        .password
        .as_deref()
        .ok_or_else(|| eyre::eyre!("ADMIN_PASSWORD must be set to reset the admin account"))?;

    let outcome = users
        .reset_admin(&admin.username, &admin.email, password)
        .await?;

    match outcome {
        AdminReset::Created => info!(username = %admin.username, "Admin user created"),
        AdminReset::PasswordReset => {
            warn!(username = %admin.username, "Admin password reset and account re-activated")
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_helpers::{JwtAuth, JwtConfig};
    use domain_users::{InMemoryUserRepository, LoginRequest};

    fn users() -> UserService<InMemoryUserRepository> {
        let auth =
            JwtAuth::new(&JwtConfig::new("test-secret-key-at-least-32-characters-long", 3600).unwrap());
        UserService::new(InMemoryUserRepository::new(), auth)
    }

    fn admin(password: Option<&str>) -> AdminConfig {
        AdminConfig {
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_bootstrap_skipped_without_password() {
        let users = users();
        assert_eq!(bootstrap(&users, &admin(None)).await.unwrap(), None);
        assert!(!users.admin_exists("admin").await.unwrap());
    }

    #[tokio::test]
    async fn test_bootstrap_creates_admin_once() {
        let users = users();
        let first = bootstrap(&users, &admin(Some("secret1"))).await.unwrap();
        assert_eq!(first, Some(AdminReset::Created));

        // A changed password does not touch the existing account
        let second = bootstrap(&users, &admin(Some("other-pass"))).await.unwrap();
        assert_eq!(second, None);

        let login = users
            .login(LoginRequest {
                username: "admin".to_string(),
                password: "secret1".to_string(),
            })
            .await;
        assert!(login.is_ok());
    }

    #[tokio::test]
    async fn test_reset_requires_password() {
        let users = users();
        assert!(reset(&users, &admin(None)).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_changes_existing_password() {
        let users = users();
        reset(&users, &admin(Some("secret1"))).await.unwrap();
        let outcome = reset(&users, &admin(Some("secret2"))).await.unwrap();
        assert_eq!(outcome, AdminReset::PasswordReset);

        let login = users
            .login(LoginRequest {
                username: "admin".to_string(),
                password: "secret2".to_string(),
            })
            .await;
        assert!(login.is_ok());
    }
}
