use std::sync::Arc;

use axum::{
    extract::State,
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;

use super::{Composition, FullPage, Render, Service};
use crate::observability::{request_span, Acknowledge};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Homepage {
    logged_in: bool,
}

/// The landing page. Renders for anonymous callers too.
pub async fn homepage(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    let _entered = request_span("home", "page", &parts.method, &parts.uri).entered();

    let session = service.optional_session(&parts);
    let language = service.language(&parts.headers);

    FullPage::compose(
        &service,
        Render {
            partial: "home/homepage",
            helpers: service.base_helpers(language),
            title: service.translate(language, "nav-home"),
            session: session.as_ref(),
            payload: Homepage {
                logged_in: session.is_some(),
            },
        },
    )
    .acknowledged("rendering homepage")
    .into_response()
}

pub fn routes() -> Router<Arc<Service>> {
    Router::new()
        .route("/", get(homepage))
        .route("/dashboard", get(homepage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::handlers::router;
    use crate::testing::{body_string, failing_session_fetcher, get, test_service};

    #[tokio::test]
    async fn anonymous_visitors_get_the_login_links() {
        let app = router(Arc::new(test_service().with_session_fetcher(failing_session_fetcher())));

        let res = app.oneshot(get("/")).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = body_string(res).await;
        assert!(body.contains(r#"hx-get="/components/login_prompt""#));
        assert!(!body.contains(r#"hx-post="/logout""#));
    }

    #[tokio::test]
    async fn signed_in_visitors_get_the_dashboard() {
        let app = router(Arc::new(test_service()));

        for uri in ["/", "/dashboard"] {
            let res = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{}", uri);
            let body = body_string(res).await;
            assert!(body.contains("<title>Home | Prixfixe</title>"), "{}", uri);
            assert!(body.contains(r#"hx-post="/logout""#), "{}", uri);
            assert!(body.contains(r#"hx-get="/dashboard_pages/valid_ingredients""#), "{}", uri);
        }
    }
}
