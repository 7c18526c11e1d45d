use super::jwt::{JwtAuth, JwtClaims};
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer};

/// Cookie carrying the token for browser clients
pub const TOKEN_COOKIE: &str = "token";

/// Extract a token from `Authorization: Bearer` first, then the `token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookies| cookies.get(TOKEN_COOKIE).map(str::to_string))
        .filter(|token| !token.is_empty())
}

fn authenticate(auth: &JwtAuth, headers: &HeaderMap) -> Result<JwtClaims, AppError> {
    let token = extract_token(headers).ok_or_else(|| {
        tracing::debug!("No JWT found in Authorization header or cookie");
        AppError::Unauthorized("No token provided".to_string())
    })?;

    auth.verify_token(&token).map_err(|e| {
        tracing::debug!("JWT verification failed: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })
}

/// Staff-only guard.
///
/// Rejects missing or invalid tokens with 401 and customer tokens with 403.
/// When a staff validator is registered, the account must still exist and be
/// active. Inserts [`JwtClaims`] into request extensions on success.
///
/// # Example
///
/// ```ignore
/// let admin_routes = Router::new()
///     .route("/", post(create_product))
///     .route_layer(axum::middleware::from_fn_with_state(auth.clone(), require_staff));
/// ```
pub async fn require_staff(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&auth, request.headers())?;

    if !claims.is_staff() {
        tracing::debug!(sub = %claims.sub, "Customer token used on staff route");
        return Err(AppError::Forbidden("Staff access required".to_string()));
    }

    if let Some(validator) = auth.staff_validator() {
        let id = claims.principal_id()?;
        if !validator.is_active(id).await? {
            return Err(AppError::Unauthorized(
                "User not found or inactive".to_string(),
            ));
        }
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Customer-only guard: 401 without a valid token, 403 for staff tokens.
pub async fn require_customer(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&auth, request.headers())?;

    if !claims.is_customer() {
        return Err(AppError::Forbidden("Customer access required".to_string()));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Optional authentication.
///
/// Inserts claims when a valid token is present and never rejects, so guest
/// and signed-in callers share the same route.
pub async fn optional_auth(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(claims) = authenticate(&auth, request.headers()) {
        request.extensions_mut().insert(claims);
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthUser, JwtConfig, OptionalAuthUser, PrincipalValidator};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{StatusCode, header},
        middleware::from_fn_with_state,
        routing::get,
    };
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("middleware-test-secret-long-enough-xx", 600).unwrap())
    }

    async fn whoami(AuthUser(claims): AuthUser) -> String {
        claims.name
    }

    async fn maybe(OptionalAuthUser(claims): OptionalAuthUser) -> String {
        claims.map(|c| c.name).unwrap_or_else(|| "guest".to_string())
    }

    fn staff_app(auth: JwtAuth) -> Router {
        Router::new()
            .route("/", get(whoami))
            .route_layer(from_fn_with_state(auth, require_staff))
    }

    fn customer_app(auth: JwtAuth) -> Router {
        Router::new()
            .route("/", get(whoami))
            .route_layer(from_fn_with_state(auth, require_customer))
    }

    fn optional_app(auth: JwtAuth) -> Router {
        Router::new()
            .route("/", get(maybe))
            .layer(from_fn_with_state(auth, optional_auth))
    }

    fn bearer(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        use http_body_util::BodyExt;
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        headers.insert(header::COOKIE, "token=cookie".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_falls_back_to_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; token=xyz".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_extract_token_none() {
        assert!(extract_token(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn test_require_staff_without_token_is_401() {
        let response = staff_app(auth())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_staff_with_invalid_token_is_401() {
        let response = staff_app(auth()).oneshot(bearer("garbage")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_staff_rejects_customer_token() {
        let auth = auth();
        let token = auth
            .create_customer_token(Uuid::new_v4(), "ana@example.com")
            .unwrap();

        let response = staff_app(auth).oneshot(bearer(&token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_staff_accepts_staff_token() {
        let auth = auth();
        let token = auth
            .create_staff_token(Uuid::new_v4(), "admin", "admin")
            .unwrap();

        let response = staff_app(auth).oneshot(bearer(&token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "admin");
    }

    struct Deny;

    #[async_trait]
    impl PrincipalValidator for Deny {
        async fn is_active(&self, _id: Uuid) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_require_staff_rejects_inactive_user() {
        let auth = auth().with_staff_validator(Arc::new(Deny));
        let token = auth
            .create_staff_token(Uuid::new_v4(), "gone", "manager")
            .unwrap();

        let response = staff_app(auth).oneshot(bearer(&token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_customer_rejects_staff_token() {
        let auth = auth();
        let token = auth
            .create_staff_token(Uuid::new_v4(), "admin", "admin")
            .unwrap();

        let response = customer_app(auth).oneshot(bearer(&token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_customer_accepts_cookie() {
        let auth = auth();
        let token = auth
            .create_customer_token(Uuid::new_v4(), "ana@example.com")
            .unwrap();

        let request = Request::builder()
            .uri("/")
            .header(header::COOKIE, format!("token={}", token))
            .body(Body::empty())
            .unwrap();

        let response = customer_app(auth).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ana@example.com");
    }

    #[tokio::test]
    async fn test_optional_auth_never_rejects() {
        let response = optional_app(auth()).oneshot(bearer("garbage")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "guest");
    }

    #[tokio::test]
    async fn test_optional_auth_inserts_claims() {
        let auth = auth();
        let token = auth
            .create_customer_token(Uuid::new_v4(), "ana@example.com")
            .unwrap();

        let response = optional_app(auth).oneshot(bearer(&token)).await.unwrap();
        assert_eq!(body_text(response).await, "ana@example.com");
    }
}
