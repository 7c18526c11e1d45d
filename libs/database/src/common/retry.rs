use core_config::{ConfigError, FromEnv, env_parse};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Backoff for the start-up connection, when Postgres may still be booting
/// next to the API container.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub first_delay: Duration,
    pub max_delay: Duration,
    /// Randomize each wait to 50-100% of its nominal value
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            first_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(8),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Nominal wait before each retry: doubling from `first_delay`, capped at `max_delay`
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        std::iter::successors(Some(self.first_delay.min(self.max_delay)), |prev| {
            Some(prev.saturating_mul(2).min(self.max_delay))
        })
        .take(self.max_retries as usize)
    }
}

/// - `DB_CONNECT_RETRIES` (default 5)
/// - `DB_RETRY_DELAY_MS` (default 250)
/// - `DB_RETRY_MAX_DELAY_MS` (default 8000)
impl FromEnv for RetryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            max_retries: env_parse("DB_CONNECT_RETRIES", defaults.max_retries)?,
            first_delay: Duration::from_millis(env_parse(
                "DB_RETRY_DELAY_MS",
                defaults.first_delay.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(env_parse(
                "DB_RETRY_MAX_DELAY_MS",
                defaults.max_delay.as_millis() as u64,
            )?),
            jitter: defaults.jitter,
        })
    }
}

/// Run `operation` until it succeeds or the schedule runs out; the last
/// error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut waits = config.schedule();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, "Connected after retrying");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        let Some(wait) = waits.next() else {
            warn!(attempt, error = %error, "Giving up");
            return Err(error);
        };
        let wait = if config.jitter { jittered(wait) } else { wait };

        warn!(
            attempt,
            error = %error,
            retry_in_ms = wait.as_millis() as u64,
            "Attempt failed"
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

/// [`retry_with_backoff`] with the default schedule.
pub async fn retry<F, Fut, T, E>(operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(operation, RetryConfig::default()).await
}

fn jittered(wait: Duration) -> Duration {
    let percent = 50 + (Uuid::new_v4().as_u128() % 51) as u32;
    wait * percent / 100
}
