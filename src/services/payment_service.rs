use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::datastore::ApiBackend;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("unknown subscription plan: {0}")]
    UnknownPlan(String),
    #[error("payment processor failed: {0}")]
    Processor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub session_id: String,
}

/// Starts hosted checkout flows with the payment processor.
#[async_trait]
pub trait PaymentManager: Send + Sync {
    async fn create_checkout_session(&self, plan_id: &str) -> Result<CheckoutSession, PaymentError>;
}

pub struct ApiPaymentManager {
    backend: ApiBackend,
}

impl ApiPaymentManager {
    pub fn new(backend: ApiBackend) -> Self {
        Self { backend }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest<'a> {
    subscription_plan_id: &'a str,
}

#[async_trait]
impl PaymentManager for ApiPaymentManager {
    async fn create_checkout_session(&self, plan_id: &str) -> Result<CheckoutSession, PaymentError> {
        let request = self
            .backend
            .client()
            .post(self.backend.url("/billing/checkout_sessions"))
            .json(&CheckoutRequest {
                subscription_plan_id: plan_id,
            });

        self.backend.fetch(request).await.map_err(|err| match err {
            crate::datastore::DataStoreError::NotFound => PaymentError::UnknownPlan(plan_id.to_string()),
            other => PaymentError::Processor(other.to_string()),
        })
    }
}
