use axum::http::{HeaderValue, Method, header};
use core_config::{ConfigError, FromEnv, env_optional};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Storefront and backoffice origins that are always allowed.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:3001",
    "http://192.168.0.2:3000",
    "http://192.168.0.2:3001",
    "https://mr-tecnologia-front-web.vercel.app",
    "https://mr-tecnologia-front-backoffice.vercel.app",
];

/// Allowed CORS origins.
///
/// `CORS_ALLOWED_ORIGIN` takes a comma-separated list that is merged with
/// [`DEFAULT_ALLOWED_ORIGINS`]. A trailing `/` on an origin is dropped since
/// browsers never send one.
#[derive(Clone, Debug)]
pub struct CorsConfig {
    pub origins: Vec<String>,
}

impl CorsConfig {
    pub fn with_extra_origins(extra: Option<&str>) -> Self {
        let mut origins: Vec<String> = DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(|o| o.to_string())
            .collect();

        for origin in extra.unwrap_or_default().split(',') {
            let origin = origin.trim().trim_end_matches('/');
            if !origin.is_empty() && !origins.iter().any(|o| o == origin) {
                origins.push(origin.to_string());
            }
        }

        Self { origins }
    }
}

impl FromEnv for CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let extra = env_optional("CORS_ALLOWED_ORIGIN");
        let config = Self::with_extra_origins(extra.as_deref());

        for origin in &config.origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: format!("'{}' is not a valid origin: {}", origin, e),
            })?;
        }

        Ok(config)
    }
}

/// Creates the CORS layer for the API:
/// - origins from [`CorsConfig`]
/// - GET, POST, PUT, PATCH, DELETE, OPTIONS
/// - Content-Type, Authorization, Accept, Cookie
/// - credentials allowed, 1 hour max age
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only() {
        let config = CorsConfig::with_extra_origins(None);
        assert_eq!(config.origins.len(), DEFAULT_ALLOWED_ORIGINS.len());
    }

    #[test]
    fn test_extra_origins_are_trimmed_and_deduplicated() {
        let config = CorsConfig::with_extra_origins(Some(
            "https://shop.example.com/, http://localhost:3000 ,,",
        ));

        assert!(config.origins.contains(&"https://shop.example.com".to_string()));
        assert_eq!(config.origins.len(), DEFAULT_ALLOWED_ORIGINS.len() + 1);
    }

    #[test]
    fn test_from_env_reads_cors_allowed_origin() {
        temp_env::with_var("CORS_ALLOWED_ORIGIN", Some("https://admin.example.com/"), || {
            let config = CorsConfig::from_env().unwrap();
            assert!(config.origins.iter().any(|o| o == "https://admin.example.com"));
        });
    }
}
