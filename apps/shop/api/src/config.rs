use axum_helpers::{CorsConfig, JwtConfig};
use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, env_optional, env_or_default, env_parse,
    server::ServerConfig,
};
use database::postgres::PostgresConfig;
use domain_orders::{ShippingConfig, WebpayConfig};

pub use core_config::Environment;

/// Admin account used by the start-up bootstrap and `reset-admin`
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    /// Never defaulted; bootstrap is skipped when unset
    pub password: Option<String>,
}

impl FromEnv for AdminConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            username: env_or_default("ADMIN_USERNAME", "admin"),
            email: env_or_default("ADMIN_EMAIL", "admin@example.com"),
            password: env_optional("ADMIN_PASSWORD"),
        })
    }
}

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub webpay: WebpayConfig,
    pub shipping: ShippingConfig,
    pub admin: AdminConfig,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            database: PostgresConfig::from_env()?,
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
            jwt: JwtConfig::from_env()?,
            cors: CorsConfig::from_env()?,
            webpay: WebpayConfig::from_env()?,
            shipping: ShippingConfig::from_env()?,
            admin: AdminConfig::from_env()?,
            run_migrations: env_parse("RUN_MIGRATIONS", true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/shop")),
                ("JWT_SECRET", Some(SECRET)),
                ("PORT", None),
                ("RUN_MIGRATIONS", None),
                ("ADMIN_USERNAME", None),
                ("ADMIN_EMAIL", None),
                ("ADMIN_PASSWORD", None),
                ("CORS_ALLOWED_ORIGIN", None),
                ("FRONTEND_URL", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "shop_api");
                assert_eq!(config.server.port, 3004);
                assert!(config.run_migrations);
                assert_eq!(config.admin.username, "admin");
                assert_eq!(config.admin.email, "admin@example.com");
                assert!(config.admin.password.is_none());
                assert_eq!(config.webpay.frontend_url, "http://localhost:3000");
                assert!(
                    config
                        .cors
                        .origins
                        .iter()
                        .any(|o| o == "https://mr-tecnologia-front-web.vercel.app")
                );
            },
        );
    }

    #[test]
    fn test_config_overrides() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/shop")),
                ("JWT_SECRET", Some(SECRET)),
                ("RUN_MIGRATIONS", Some("false")),
                ("ADMIN_USERNAME", Some("root")),
                ("ADMIN_PASSWORD", Some("changeme")),
                ("CORS_ALLOWED_ORIGIN", Some("https://tienda.example.cl/")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(!config.run_migrations);
                assert_eq!(config.admin.username, "root");
                assert_eq!(config.admin.password.as_deref(), Some("changeme"));
                assert!(
                    config
                        .cors
                        .origins
                        .iter()
                        .any(|o| o == "https://tienda.example.cl")
                );
            },
        );
    }

    #[test]
    fn test_blank_admin_password_is_unset() {
        temp_env::with_var("ADMIN_PASSWORD", Some("   "), || {
            let admin = AdminConfig::from_env().unwrap();
            assert!(admin.password.is_none());
        });
    }

    #[test]
    fn test_missing_jwt_secret_fails() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/shop")),
                ("JWT_SECRET", None),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("JWT_SECRET"));
            },
        );
    }

    #[test]
    fn test_invalid_run_migrations_fails() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/shop")),
                ("JWT_SECRET", Some(SECRET)),
                ("RUN_MIGRATIONS", Some("sometimes")),
            ],
            || {
                assert!(Config::from_env().is_err());
            },
        );
    }
}
