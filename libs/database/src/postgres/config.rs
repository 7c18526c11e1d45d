use core_config::{ConfigError, FromEnv, env_parse, env_required};
use sea_orm::ConnectOptions;
use std::time::Duration;
use tracing::log::LevelFilter;

/// Pool settings for the shop database.
///
/// ```ignore
/// use database::postgres::PostgresConfig;
///
/// let options = PostgresConfig::from_env()?.into_connect_options();
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Applied to connect, acquire, idle and lifetime limits unless overridden
    pub timeouts: PoolTimeouts,
    /// `None` turns statement logging off
    pub statement_log: Option<LevelFilter>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolTimeouts {
    pub connect: Duration,
    pub acquire: Duration,
    pub idle: Duration,
    pub max_lifetime: Duration,
}

impl PoolTimeouts {
    pub const fn uniform(limit: Duration) -> Self {
        Self {
            connect: limit,
            acquire: limit,
            idle: limit,
            max_lifetime: limit,
        }
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 100,
            min_connections: 5,
            timeouts: PoolTimeouts::uniform(DEFAULT_TIMEOUT),
            statement_log: Some(LevelFilter::Info),
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn into_connect_options(self) -> ConnectOptions {
        let PoolTimeouts {
            connect,
            acquire,
            idle,
            max_lifetime,
        } = self.timeouts;

        let mut options = ConnectOptions::new(self.url);
        options
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(connect)
            .acquire_timeout(acquire)
            .idle_timeout(idle)
            .max_lifetime(max_lifetime)
            .sqlx_logging(self.statement_log.is_some())
            .sqlx_logging_level(self.statement_log.unwrap_or(LevelFilter::Off));
        options
    }
}

fn env_secs(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    env_parse(key, default.as_secs()).map(Duration::from_secs)
}

/// - `DATABASE_URL` (required)
/// - `DB_MAX_CONNECTIONS` / `DB_MIN_CONNECTIONS` (100 / 5)
/// - `DB_CONNECT_TIMEOUT_SECS`, `DB_ACQUIRE_TIMEOUT_SECS`,
///   `DB_IDLE_TIMEOUT_SECS`, `DB_MAX_LIFETIME_SECS` (8 each)
/// - `DB_SQLX_LOGGING` (true)
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base = Self::default();
        let max_connections = env_parse("DB_MAX_CONNECTIONS", base.max_connections)?;
        let min_connections = env_parse("DB_MIN_CONNECTIONS", base.min_connections)?;

        if min_connections > max_connections {
            return Err(ConfigError::ParseError {
                key: "DB_MIN_CONNECTIONS".to_string(),
                details: format!(
                    "{} is above DB_MAX_CONNECTIONS ({})",
                    min_connections, max_connections
                ),
            });
        }

        let timeouts = PoolTimeouts {
            connect: env_secs("DB_CONNECT_TIMEOUT_SECS", base.timeouts.connect)?,
            acquire: env_secs("DB_ACQUIRE_TIMEOUT_SECS", base.timeouts.acquire)?,
            idle: env_secs("DB_IDLE_TIMEOUT_SECS", base.timeouts.idle)?,
            max_lifetime: env_secs("DB_MAX_LIFETIME_SECS", base.timeouts.max_lifetime)?,
        };

        let statement_log = env_parse("DB_SQLX_LOGGING", true)?
            .then_some(LevelFilter::Info);

        Ok(Self {
            url: env_required("DATABASE_URL")?,
            max_connections,
            min_connections,
            timeouts,
            statement_log,
        })
    }
}
