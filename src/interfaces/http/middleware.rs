//! Authentication middleware for Axum

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::infrastructure::crypto::jwt::{verify_token, JwtConfig, TokenClaims};

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

/// Authentication state: verify-only, tokens are minted elsewhere
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Authenticated user information extracted from a verified JWT
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: TokenClaims) -> Option<Self> {
        let user_id = claims.user_id()?;
        Some(Self {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == "Admin"
    }
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Bearer-token authentication middleware.
///
/// Expiry is enforced by `jsonwebtoken`'s default validation, so an
/// expired token already fails `verify_token`.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let Some(auth_header) = auth_header else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => match AuthenticatedUser::from_claims(claims) {
            Some(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            None => auth_error_response(AuthError::InvalidToken),
        },
        Err(_) => auth_error_response(AuthError::InvalidToken),
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let message = match error {
        AuthError::MissingToken => "Missing authentication token",
        AuthError::InvalidToken => "Invalid authentication token",
    };

    let body = Json(json!({
        "success": false,
        "error": message
    }));

    (StatusCode::UNAUTHORIZED, body).into_response()
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Request as HttpRequest};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::ServiceExt;

    use crate::infrastructure::crypto::jwt::create_token;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "middleware-test-secret".to_string(),
            expiration_hours: 1,
            issuer: "parking-service".to_string(),
        }
    }

    async fn whoami(Extension(user): Extension<AuthenticatedUser>) -> String {
        format!("{}:{}", user.user_id, user.email)
    }

    fn app(config: JwtConfig) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(
                AuthState { jwt_config: config },
                auth_middleware,
            ))
    }

    fn request(headers: HeaderMap) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/whoami");
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_401() {
        let resp = app(jwt_config()).oneshot(request(HeaderMap::new())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_bearer_token_passes_identity_through() {
        let cfg = jwt_config();
        let token = create_token(42, "driver@example.com", "User", &cfg).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );

        let resp = app(cfg).oneshot(request(headers)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"42:driver@example.com");
    }

    #[tokio::test]
    async fn token_signed_by_another_key_is_401() {
        let mut other = jwt_config();
        other.secret = "a-different-secret".to_string();
        let token = create_token(42, "driver@example.com", "User", &other).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", token).parse().unwrap(),
        );

        let resp = app(jwt_config()).oneshot(request(headers)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_401() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        let resp = app(jwt_config()).oneshot(request(headers)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
