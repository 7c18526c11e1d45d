use super::config::JwtConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Which kind of account a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Staff,
    Customer,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,          // Subject (user or customer ID)
    pub name: String,         // Username or email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>, // Staff role
    pub kind: PrincipalKind,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl JwtClaims {
    /// Parse `sub` as the principal id.
    pub fn principal_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
    }

    pub fn is_staff(&self) -> bool {
        self.kind == PrincipalKind::Staff
    }

    pub fn is_customer(&self) -> bool {
        self.kind == PrincipalKind::Customer
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

/// Confirms a staff principal still exists and is active.
///
/// Registered on [`JwtAuth`] by the users domain so revoked staff accounts are
/// rejected even while their tokens have not expired.
#[async_trait]
pub trait PrincipalValidator: Send + Sync {
    async fn is_active(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Stateless HS256 JWT issuer and verifier
#[derive(Clone)]
pub struct JwtAuth {
    secret: Arc<str>,
    ttl_secs: i64,
    staff_validator: Option<Arc<dyn PrincipalValidator>>,
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("ttl_secs", &self.ttl_secs)
            .field("staff_validator", &self.staff_validator.is_some())
            .finish()
    }
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(ttl_secs = config.ttl_secs, "JWT auth initialized");
        Self {
            secret: Arc::from(config.secret.as_str()),
            ttl_secs: config.ttl_secs,
            staff_validator: None,
        }
    }

    /// Register the check that staff tokens still map to an active account.
    pub fn with_staff_validator(mut self, validator: Arc<dyn PrincipalValidator>) -> Self {
        self.staff_validator = Some(validator);
        self
    }

    pub fn staff_validator(&self) -> Option<&Arc<dyn PrincipalValidator>> {
        self.staff_validator.as_ref()
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for a staff user carrying its role.
    pub fn create_staff_token(&self, id: Uuid, username: &str, role: &str) -> eyre::Result<String> {
        self.create_token(id, username, Some(role.to_string()), PrincipalKind::Staff)
    }

    /// Issue a token for a storefront customer.
    pub fn create_customer_token(&self, id: Uuid, email: &str) -> eyre::Result<String> {
        self.create_token(id, email, None, PrincipalKind::Customer)
    }

    fn create_token(
        &self,
        id: Uuid,
        name: &str,
        role: Option<String>,
        kind: PrincipalKind,
    ) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: id.to_string(),
            name: name.to_string(),
            role,
            kind,
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify JWT token signature and expiry and decode claims
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }
}
