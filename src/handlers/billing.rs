//! Checkout side-channel: starting a hosted checkout, and the acknowledgements
//! the payment processor sends the browser back to.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::{Composition, Fragment, Render, Service};
use crate::error::{FrontendError, FrontendResult};
use crate::observability::{request_span, Acknowledge};

pub const CHECKOUT_RESULT_PARTIAL: &str = "billing/checkout_result";

/// A plan offered on the account settings page. Prices are in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriptionPlan {
    pub id: &'static str,
    pub name: &'static str,
    pub price: u64,
}

pub const SUBSCRIPTION_PLANS: &[SubscriptionPlan] = &[
    SubscriptionPlan {
        id: "plan_home_cook",
        name: "Home Cook",
        price: 499,
    },
    SubscriptionPlan {
        id: "plan_sous_chef",
        name: "Sous Chef",
        price: 999,
    },
    SubscriptionPlan {
        id: "plan_head_chef",
        name: "Head Chef",
        price: 2499,
    },
];

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutParams {
    plan: Option<String>,
}

impl CheckoutParams {
    fn plan_id(&self) -> Option<&str> {
        self.plan.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

pub async fn begin_checkout(
    State(service): State<Arc<Service>>,
    params: Option<Query<CheckoutParams>>,
    parts: Parts,
) -> Response {
    let span = request_span("billing", "checkout", &parts.method, &parts.uri);
    let params = params.map(|Query(p)| p).unwrap_or_default();

    start_checkout(&service, &parts, &params)
        .instrument(span)
        .await
        .into_response()
}

async fn start_checkout(service: &Service, parts: &Parts, params: &CheckoutParams) -> FrontendResult<Response> {
    service.require_session(parts, None)?;

    let Some(plan_id) = params.plan_id() else {
        tracing::warn!("checkout requested without a plan");
        return Err(FrontendError::invalid_parameter("plan"));
    };

    let session = service
        .payment_manager
        .create_checkout_session(plan_id)
        .await
        .acknowledged("creating checkout session")?;
    tracing::info!(plan = plan_id, "checkout session created");

    Ok(Json(session).into_response())
}

#[derive(Debug, Serialize)]
struct CheckoutResult {
    succeeded: bool,
    message: &'static str,
}

fn acknowledge_checkout(service: &Service, parts: &Parts, succeeded: bool, message: &'static str) -> Response {
    let _entered = request_span("billing", "acknowledgement", &parts.method, &parts.uri).entered();
    tracing::info!(succeeded, "checkout acknowledgement");

    Fragment::compose(
        service,
        Render {
            partial: CHECKOUT_RESULT_PARTIAL,
            helpers: service.base_helpers(service.language(&parts.headers)),
            title: String::new(),
            session: None,
            payload: CheckoutResult { succeeded, message },
        },
    )
    .acknowledged("rendering checkout result")
    .into_response()
}

pub async fn checkout_success(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    acknowledge_checkout(&service, &parts, true, "billing-checkout-success")
}

pub async fn checkout_cancel(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    acknowledge_checkout(&service, &parts, false, "billing-checkout-cancelled")
}

pub async fn checkout_failure(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    acknowledge_checkout(&service, &parts, false, "billing-checkout-failed")
}

pub fn routes() -> Router<Arc<Service>> {
    Router::new()
        .route("/billing/checkout/begin", post(begin_checkout))
        .route("/billing/checkout/success", post(checkout_success))
        .route("/billing/checkout/cancel", post(checkout_cancel))
        .route("/billing/checkout/failures", post(checkout_failure))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use crate::handlers::router;
    use crate::services::{CheckoutSession, PaymentError};
    use crate::testing::{body_string, failing_session_fetcher, test_service, MockPaymentManager};

    fn post(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn service_with(payments: &Arc<MockPaymentManager>) -> Service {
        let mut service = test_service();
        service.payment_manager = payments.clone();
        service
    }

    #[tokio::test]
    async fn missing_plan_is_a_bad_request() {
        let payments = Arc::new(MockPaymentManager::default());
        let app = router(Arc::new(service_with(&payments)));

        for uri in ["/billing/checkout/begin", "/billing/checkout/begin?plan=", "/billing/checkout/begin?other=1"] {
            let res = app.clone().oneshot(post(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
        assert!(payments.plans().is_empty());
    }

    #[tokio::test]
    async fn begin_returns_the_checkout_session() {
        let payments = Arc::new(MockPaymentManager::default());
        payments.expect(Ok(CheckoutSession {
            session_id: "cs_test_123".to_string(),
        }));
        let app = router(Arc::new(service_with(&payments)));

        let res = app.oneshot(post("/billing/checkout/begin?plan=plan_sous_chef")).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_string(res).await).unwrap();
        assert_eq!(body, serde_json::json!({ "sessionId": "cs_test_123" }));
        assert_eq!(payments.plans(), vec!["plan_sous_chef".to_string()]);
    }

    #[tokio::test]
    async fn payment_failures_are_server_errors() {
        let payments = Arc::new(MockPaymentManager::default());
        payments.expect(Err(PaymentError::Processor("card network down".into())));
        let app = router(Arc::new(service_with(&payments)));

        let res = app.oneshot(post("/billing/checkout/begin?plan=plan_home_cook")).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(res).await.is_empty());
    }

    #[tokio::test]
    async fn checkout_requires_a_session() {
        let payments = Arc::new(MockPaymentManager::default());
        let service = service_with(&payments).with_session_fetcher(failing_session_fetcher());

        let res = router(Arc::new(service))
            .oneshot(post("/billing/checkout/begin?plan=plan_home_cook"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert!(payments.plans().is_empty());
    }

    #[tokio::test]
    async fn acknowledgements_render_fixed_messages() {
        let app = router(Arc::new(test_service()));

        let cases = [
            ("/billing/checkout/success", "Thanks! Your subscription is active.", "alert-success"),
            ("/billing/checkout/cancel", "Checkout cancelled.", "alert-warning"),
            ("/billing/checkout/failures", "Something went wrong with your checkout.", "alert-warning"),
        ];
        for (uri, message, class) in cases {
            let res = app.clone().oneshot(post(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::OK, "{}", uri);
            let body = body_string(res).await;
            assert!(body.contains(message), "{}", uri);
            assert!(body.contains(class), "{}", uri);
        }
    }

    #[test]
    fn plans_stay_under_the_price_ceiling() {
        assert!(SUBSCRIPTION_PLANS.iter().all(|p| p.price < 100_000));
    }
}
