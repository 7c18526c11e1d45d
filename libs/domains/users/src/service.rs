use async_trait::async_trait;
use axum_helpers::{AppError, JwtAuth, PrincipalValidator, hash_password, verify_password};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{
    AdminReset, CreateUser, LoginRequest, LoginResponse, LoginUser, User, UserResponse, UserRole,
};
use crate::repository::UserRepository;

/// Service layer for staff accounts and backoffice login
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    auth: JwtAuth,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            auth: self.auth.clone(),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R, auth: JwtAuth) -> Self {
        Self {
            repository: Arc::new(repository),
            auth,
        }
    }

    /// Check credentials and issue a staff token
    ///
    /// Unknown users, inactive users and wrong passwords all fail the same way.
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginRequest) -> UserResult<LoginResponse> {
        let user = self
            .repository
            .get_by_username(&input.username)
            .await?
            .filter(|u| u.is_active)
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash) {
            return Err(UserError::InvalidCredentials);
        }

        let access_token = self
            .auth
            .create_staff_token(user.id, &user.username, &user.role.to_string())
            .map_err(|e| {
                tracing::error!("Failed to create access token: {:?}", e);
                UserError::Internal("Failed to create token".to_string())
            })?;

        Ok(LoginResponse {
            access_token,
            user: LoginUser::from(&user),
        })
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<UserResponse> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        if self.repository.exists(&input.username, &input.email).await? {
            return Err(UserError::Duplicate(input.username));
        }

        let password_hash = hash(&input.password)?;
        let user = User::new(
            input.username,
            input.email,
            password_hash,
            input.role.unwrap_or_default(),
            input.full_name,
        );

        let created = self.repository.create(user).await?;
        Ok(created.into())
    }

    pub async fn get_user(&self, id: Uuid) -> UserResult<UserResponse> {
        self.repository
            .get_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(UserError::NotFound(id))
    }

    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.list().await?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    /// Create the admin account, or reset its password and re-activate it
    #[instrument(skip(self, password))]
    pub async fn reset_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> UserResult<AdminReset> {
        if password.len() < 6 {
            return Err(UserError::Validation(
                "Admin password must be at least 6 characters".to_string(),
            ));
        }

        let password_hash = hash(password)?;

        match self.repository.get_by_username(username).await? {
            Some(mut user) => {
                user.password_hash = password_hash;
                user.is_active = true;
                self.repository.update(user).await?;
                tracing::info!(username, "Admin password reset");
                Ok(AdminReset::PasswordReset)
            }
            None => {
                let user = User::new(
                    username.to_string(),
                    email.to_string(),
                    password_hash,
                    UserRole::Admin,
                    Some("Administrador".to_string()),
                );
                self.repository.create(user).await?;
                tracing::info!(username, "Admin user created");
                Ok(AdminReset::Created)
            }
        }
    }

    /// Whether an admin account with this username already exists
    pub async fn admin_exists(&self, username: &str) -> UserResult<bool> {
        Ok(self.repository.get_by_username(username).await?.is_some())
    }
}

impl<R: UserRepository + 'static> UserService<R> {
    /// Staff-token validator backed by this service's repository
    pub fn principal_validator(&self) -> Arc<dyn PrincipalValidator> {
        Arc::new(ActiveStaffValidator {
            repository: Arc::clone(&self.repository),
        })
    }
}

fn hash(password: &str) -> UserResult<String> {
    hash_password(password).map_err(|e| UserError::Internal(e.to_string()))
}

/// Rejects staff tokens whose account was deleted or deactivated
struct ActiveStaffValidator<R: UserRepository> {
    repository: Arc<R>,
}

#[async_trait]
impl<R: UserRepository> PrincipalValidator for ActiveStaffValidator<R> {
    async fn is_active(&self, id: Uuid) -> Result<bool, AppError> {
        let user = self.repository.get_by_id(id).await?;
        Ok(user.is_some_and(|u| u.is_active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use axum_helpers::JwtConfig;
    use mockall::predicate::eq;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("test-secret-key-at-least-32-characters-long", 3600).unwrap())
    }

    fn stored_user(password: &str, is_active: bool) -> User {
        let mut user = User::new(
            "admin".to_string(),
            "admin@example.com".to_string(),
            hash_password(password).unwrap(),
            UserRole::Admin,
            None,
        );
        user.is_active = is_active;
        user
    }

    fn login(password: &str) -> LoginRequest {
        LoginRequest {
            username: "admin".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_staff_token_with_role() {
        let mut repo = MockUserRepository::new();
        let user = stored_user("secret1", true);
        let expected_id = user.id;
        repo.expect_get_by_username()
            .with(eq("admin"))
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(repo, auth());
        let response = service.login(login("secret1")).await.unwrap();

        assert_eq!(response.user.id, expected_id);
        let claims = auth().verify_token(&response.access_token).unwrap();
        assert!(claims.is_staff());
        assert!(claims.has_role("admin"));
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let mut repo = MockUserRepository::new();
        let user = stored_user("secret1", true);
        repo.expect_get_by_username()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(repo, auth());
        let result = service.login(login("wrong-password")).await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_rejects_inactive_user() {
        let mut repo = MockUserRepository::new();
        let user = stored_user("secret1", false);
        repo.expect_get_by_username()
            .returning(move |_| Ok(Some(user.clone())));

        let service = UserService::new(repo, auth());
        let result = service.login(login("secret1")).await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_user() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_username().returning(|_| Ok(None));

        let service = UserService::new(repo, auth());
        let result = service.login(login("secret1")).await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_create_user_rejects_taken_username() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists().returning(|_, _| Ok(true));
        repo.expect_create().never();

        let service = UserService::new(repo, auth());
        let result = service
            .create_user(CreateUser {
                username: "admin".to_string(),
                email: "admin@example.com".to_string(),
                password: "secret1".to_string(),
                role: None,
                full_name: None,
            })
            .await;

        assert!(matches!(result, Err(UserError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_create_user_defaults_to_manager_and_hashes_password() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists().returning(|_, _| Ok(false));
        repo.expect_create()
            .withf(|u| u.role == UserRole::Manager && u.password_hash != "secret1")
            .returning(|u| Ok(u));

        let service = UserService::new(repo, auth());
        let created = service
            .create_user(CreateUser {
                username: "maria".to_string(),
                email: "maria@example.com".to_string(),
                password: "secret1".to_string(),
                role: None,
                full_name: Some("María".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(created.role, UserRole::Manager);
    }

    #[tokio::test]
    async fn test_reset_admin_creates_missing_admin() {
        let mut repo = MockUserRepository::new();
        repo.expect_get_by_username().returning(|_| Ok(None));
        repo.expect_create()
            .withf(|u| u.role == UserRole::Admin && u.is_active)
            .returning(|u| Ok(u));

        let service = UserService::new(repo, auth());
        let outcome = service
            .reset_admin("admin", "admin@example.com", "new-password")
            .await
            .unwrap();

        assert_eq!(outcome, AdminReset::Created);
    }

    #[tokio::test]
    async fn test_reset_admin_reactivates_existing_admin() {
        let mut repo = MockUserRepository::new();
        let user = stored_user("old-password", false);
        repo.expect_get_by_username()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_update()
            .withf(|u| u.is_active && verify_password("new-password", &u.password_hash))
            .returning(|u| Ok(u));

        let service = UserService::new(repo, auth());
        let outcome = service
            .reset_admin("admin", "admin@example.com", "new-password")
            .await
            .unwrap();

        assert_eq!(outcome, AdminReset::PasswordReset);
    }

    #[tokio::test]
    async fn test_principal_validator_requires_active_user() {
        let mut repo = MockUserRepository::new();
        let active = stored_user("x", true);
        let active_id = active.id;
        repo.expect_get_by_id()
            .with(eq(active_id))
            .returning(move |_| Ok(Some(active.clone())));
        repo.expect_get_by_id()
            .withf(move |id| *id != active_id)
            .returning(|_| Ok(None));

        let service = UserService::new(repo, auth());
        let validator = service.principal_validator();

        assert!(validator.is_active(active_id).await.unwrap());
        assert!(!validator.is_active(Uuid::now_v7()).await.unwrap());
    }
}
