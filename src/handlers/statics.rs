use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use super::Service;

pub const STATIC_PREFIX: &str = "/static";

/// Serves `static_dir` under `/static`. A missing directory leaves the routes
/// out rather than stopping startup.
pub fn routes(static_dir: &str) -> Router<Arc<Service>> {
    if !Path::new(static_dir).is_dir() {
        tracing::error!(static_dir, "static asset directory unavailable, not serving assets");
        return Router::new();
    }

    tracing::debug!(static_dir, "serving static assets");
    Router::new().nest_service(STATIC_PREFIX, ServeDir::new(static_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::handlers::router;
    use crate::testing::{body_string, get, test_service};

    #[tokio::test]
    async fn serves_files_from_the_static_dir() {
        let mut service = test_service();
        let mut config = (*service.config).clone();
        config.server.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string();
        service.config = Arc::new(config);

        let res = router(Arc::new(service)).oneshot(get("/static/css/prixfixe.css")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("table-container"));
    }

    #[tokio::test]
    async fn missing_static_dir_is_not_fatal() {
        let mut service = test_service();
        let mut config = (*service.config).clone();
        config.server.static_dir = "/definitely/not/a/real/dir".to_string();
        service.config = Arc::new(config);

        let app = router(Arc::new(service));
        let res = app.clone().oneshot(get("/static/css/prixfixe.css")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app.oneshot(get("/_meta_/ready")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
