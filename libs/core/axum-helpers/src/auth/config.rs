//! JWT configuration loaded through `core_config::FromEnv`.

use core_config::{ConfigError, FromEnv, env_parse, env_required};

/// Default token lifetime: one day
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 86_400;

const MIN_SECRET_LEN: usize = 32;

/// JWT authentication configuration.
///
/// Loaded from environment variables:
/// - `JWT_SECRET` (required) - at least 32 characters
/// - `JWT_TTL_SECS` (optional) - token lifetime, defaults to 86400
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_secs: i64,
}

impl JwtConfig {
    /// Build a config by hand (tests, CLI tools).
    pub fn new(secret: impl Into<String>, ttl_secs: i64) -> Result<Self, ConfigError> {
        let secret = secret.into();
        validate_secret(&secret)?;

        if ttl_secs <= 0 {
            return Err(ConfigError::ParseError {
                key: "JWT_TTL_SECS".to_string(),
                details: "must be a positive number of seconds".to_string(),
            });
        }

        Ok(Self { secret, ttl_secs })
    }
}

fn validate_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::ParseError {
            key: "JWT_SECRET".to_string(),
            details: format!(
                "must be at least {} characters (got {}). Generate one with: openssl rand -base64 32",
                MIN_SECRET_LEN,
                secret.len()
            ),
        });
    }
    Ok(())
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        let ttl_secs = env_parse("JWT_TTL_SECS", DEFAULT_TOKEN_TTL_SECS)?;

        Self::new(secret, ttl_secs)
    }
}
