use std::sync::Arc;

use axum::{routing::get, Router};

use super::Service;

pub const READY_PATH: &str = "/_meta_/ready";

/// Liveness probe; answers as soon as the router is serving.
pub async fn ready() -> &'static str {
    "ok"
}

pub fn routes() -> Router<Arc<Service>> {
    Router::new().route(READY_PATH, get(ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::handlers::router;
    use crate::testing::{body_string, get, test_service};

    #[tokio::test]
    async fn ready_says_ok() {
        let res = router(Arc::new(test_service())).oneshot(get(READY_PATH)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_string(res).await, "ok");
    }
}
