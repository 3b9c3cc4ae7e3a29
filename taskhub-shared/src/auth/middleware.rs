/// Request authentication for axum
///
/// The bot sends the service token in a `token` header. `Authorization: Bearer`
/// is accepted as well so the API can be exercised with ordinary HTTP tooling.
///
/// A missing token is `401 Unauthorized`; a token that does not match is
/// `403 Forbidden`.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use taskhub_shared::auth::{middleware::require_service_token, service_token::ServiceToken};
///
/// async fn handler() -> &'static str {
///     "ok"
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(handler))
///     .layer(middleware::from_fn_with_state(
///         ServiceToken::new("secret"),
///         require_service_token,
///     ));
/// ```

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::service_token::ServiceToken;

/// Header the bot puts the service token in
pub const TOKEN_HEADER: &str = "token";

/// Authentication failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No token header and no bearer token
    #[error("No token provided")]
    MissingCredentials,

    /// Header present but not valid UTF-8 or not a bearer scheme
    #[error("Malformed credentials: {0}")]
    InvalidFormat(String),

    /// Token does not match the configured one
    #[error("Token is incorrect")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            AuthError::MissingCredentials | AuthError::InvalidFormat(_) => {
                (StatusCode::UNAUTHORIZED, "unauthorized")
            }
            AuthError::InvalidToken => (StatusCode::FORBIDDEN, "forbidden"),
        };

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Pulls the presented token out of the request headers.
///
/// The `token` header wins when both are present.
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    if let Some(value) = headers.get(TOKEN_HEADER) {
        return value
            .to_str()
            .map_err(|_| AuthError::InvalidFormat("token header is not valid text".to_string()));
    }

    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthError::MissingCredentials);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidFormat("authorization header is not valid text".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("expected Bearer token".to_string()))
}

/// Checks the request headers against the configured token.
pub fn authorize(expected: &ServiceToken, headers: &HeaderMap) -> Result<(), AuthError> {
    let presented = extract_token(headers)?;

    if expected.matches(presented) {
        Ok(())
    } else {
        tracing::warn!("Rejected request with incorrect service token");
        Err(AuthError::InvalidToken)
    }
}

/// `from_fn_with_state` middleware guarding a router with the service token.
pub async fn require_service_token(
    State(expected): State<ServiceToken>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(&expected, req.headers())?;
    Ok(next.run(req).await)
}
