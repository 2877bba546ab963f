use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_session_token, SessionError};
use crate::config::SessionConfig;
use crate::types::SessionContextData;

/// Resolves the caller's session from request parts. Held on the service so
/// tests can swap in a fetcher that always fails.
pub type SessionFetcher = Arc<dyn Fn(&Parts) -> Result<SessionContextData, SessionError> + Send + Sync>;

/// Reads the session the middleware left in the request extensions.
pub fn session_from_extensions(parts: &Parts) -> Result<SessionContextData, SessionError> {
    parts
        .extensions
        .get::<SessionContextData>()
        .cloned()
        .ok_or(SessionError::Missing)
}

pub fn default_session_fetcher() -> SessionFetcher {
    Arc::new(session_from_extensions)
}

/// Decodes the session cookie (or a Bearer token) and attaches the session
/// to the request. Requests without a valid session pass through untouched;
/// each handler decides whether that is acceptable.
pub async fn session_middleware(
    State(config): State<Arc<SessionConfig>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers(), &config.cookie_name) {
        match decode_session_token(&token, &config) {
            Ok(session) => {
                request.extensions_mut().insert(session);
            }
            Err(err) => tracing::debug!(error = %err, "ignoring unusable session token"),
        }
    }

    next.run(request).await
}

/// Session cookie first, then an `Authorization: Bearer` header.
fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use tower::ServiceExt;

    use crate::auth::generate_session_token;
    use crate::testing::{session_with_roles, test_config};

    #[test]
    fn token_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; pf=abc.def; other=1".parse().unwrap());
        assert_eq!(extract_session_token(&headers, "pf").as_deref(), Some("abc.def"));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
        assert_eq!(extract_session_token(&headers, "pf").as_deref(), Some("xyz"));

        assert_eq!(extract_session_token(&HeaderMap::new(), "pf"), None);
    }

    async fn user_id(parts: Parts) -> String {
        match session_from_extensions(&parts) {
            Ok(session) => session.requester.user_id.to_string(),
            Err(_) => "anonymous".to_string(),
        }
    }

    fn app() -> Router {
        let config = Arc::new(test_config().session);
        Router::new()
            .route("/", get(user_id))
            .layer(axum::middleware::from_fn_with_state(config, session_middleware))
    }

    #[tokio::test]
    async fn attaches_valid_sessions() {
        let config = test_config().session;
        let session = session_with_roles(&[]);
        let token = generate_session_token(session.clone(), &config).unwrap();

        let req = Request::builder()
            .uri("/")
            .header(header::COOKIE, format!("{}={}", config.cookie_name, token))
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, session.requester.user_id.to_string());
    }

    #[tokio::test]
    async fn garbage_tokens_leave_the_request_anonymous() {
        let req = Request::builder()
            .uri("/")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "anonymous");
    }
}
