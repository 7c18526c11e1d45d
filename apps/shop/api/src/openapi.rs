//! OpenAPI documentation configuration

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Combined OpenAPI documentation for the store API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MR Tecnología API",
        version = "0.1.0",
        description = "Storefront and backoffice API: catalog, checkout with Webpay, customers and reports"
    ),
    servers(
        (url = "http://localhost:3004", description = "Local development server")
    ),
    modifiers(&SecurityAddon),
    nest(
        (path = "/api", api = domain_users::handlers::ApiDoc),
        (path = "/api", api = domain_catalog::handlers::ApiDoc),
        (path = "/api", api = domain_orders::handlers::ApiDoc),
        (path = "/api", api = domain_customers::handlers::ApiDoc),
        (path = "/api", api = domain_stats::handlers::ApiDoc)
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the protected operations refer to
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
