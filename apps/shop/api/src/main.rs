//! MR Tecnología store API
//!
//! `shop_api serve` (the default) runs the HTTP server; `shop_api reset-admin`
//! creates the admin account or resets its password from `ADMIN_*`.

use axum_helpers::{JwtAuth, create_production_app, create_router, health_router};
use clap::{Parser, Subcommand};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::common::RetryConfig;
use database::postgres::{connect_from_config_with_retry, run_migrations};
use domain_users::{PgUserRepository, UserService};
use std::time::Duration;
use tracing::info;

mod admin;
mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[derive(Parser)]
#[command(name = "shop_api")]
#[command(about = "Storefront and backoffice API for MR Tecnología")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve,

    /// Create the admin account, or reset its password and re-activate it
    ResetAdmin,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to PostgreSQL");
    let db =
        connect_from_config_with_retry(config.database.clone(), Some(RetryConfig::from_env()?))
            .await?;

    if config.run_migrations {
        run_migrations::<migration::Migrator>(&db, config.app.name).await?;
    }

    let users = UserService::new(PgUserRepository::new(db.clone()), JwtAuth::new(&config.jwt));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::ResetAdmin => {
            admin::reset(&users, &config.admin).await?;
            db.close().await?;
            Ok(())
        }
        Commands::Serve => {
            admin::bootstrap(&users, &config.admin).await?;
            serve(AppState { config, db }).await
        }
    }
}

async fn serve(state: AppState) -> eyre::Result<()> {
    let api_routes = api::routes(&state);

    let app = create_router::<openapi::ApiDoc>(api_routes, &state.config.cors)
        .merge(health_router(state.config.app))
        .merge(api::health::router(state.clone()));

    info!("Starting shop API with graceful shutdown (30s timeout)");

    let db = state.db.clone();
    create_production_app(app, &state.config.server, Duration::from_secs(30), async move {
        info!("Shutting down: closing PostgreSQL pool");
        match db.close().await {
            Ok(()) => info!("PostgreSQL pool closed"),
            Err(e) => tracing::error!("Failed to close PostgreSQL pool: {}", e),
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Shop API shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tower::ServiceExt;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn app() -> Router {
        let config = temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgresql://localhost/shop")),
                ("JWT_SECRET", Some(SECRET)),
            ],
            || Config::from_env().unwrap(),
        );
        let state = AppState {
            config,
            db: MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        };

        create_router::<openapi::ApiDoc>(api::routes(&state), &state.config.cors)
            .merge(health_router(state.config.app))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["shop_api"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["shop_api", "reset-admin"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::ResetAdmin)));

        assert!(Cli::try_parse_from(["shop_api", "migrate"]).is_err());
    }

    #[tokio::test]
    async fn test_health_is_mounted_at_root() {
        let (status, body) = get(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["name"], "shop_api");
    }

    #[tokio::test]
    async fn test_shipping_options_are_public() {
        let (status, body) = get(app(), "/api/orders/shipping-options").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().is_some_and(|options| !options.is_empty()));
    }

    #[tokio::test]
    async fn test_backoffice_routes_need_a_token() {
        for uri in ["/api/stats/dashboard", "/api/customers", "/api/users", "/api/orders"] {
            let (status, _) = get(app(), uri).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, _) = get(app(), "/api/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
