// HTTP-facing error type for the frontend handlers
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::auth::SessionError;
use crate::datastore::DataStoreError;
use crate::forms::FormError;
use crate::i18n::LocalizationError;
use crate::services::{AuthError, PaymentError};
use crate::templates::TemplateError;

/// Where unauthenticated callers are sent.
pub const LOGIN_PATH: &str = "/login";

/// Every failure a frontend handler can surface to the browser.
///
/// Error responses never carry a body beyond the status line; the detail is
/// only for the logs.
#[derive(Debug, Error)]
pub enum FrontendError {
    // 303 See Other
    #[error("no session context available")]
    Unauthenticated { return_to: Option<String> },

    // 400 Bad Request
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid URL parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    Form(#[from] FormError),

    // 401 Unauthorized
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Auth(#[from] AuthError),

    // 500 Internal Server Error
    #[error(transparent)]
    DataStore(#[from] DataStoreError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl FrontendError {
    pub fn unauthenticated() -> Self {
        FrontendError::Unauthenticated { return_to: None }
    }

    pub fn unauthenticated_returning_to(path: impl Into<String>) -> Self {
        FrontendError::Unauthenticated {
            return_to: Some(path.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        FrontendError::InvalidInput(message.into())
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        FrontendError::InvalidParameter(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        FrontendError::Unauthorized(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FrontendError::Unauthenticated { .. } => StatusCode::SEE_OTHER,
            FrontendError::InvalidInput(_)
            | FrontendError::InvalidParameter(_)
            | FrontendError::Form(_) => StatusCode::BAD_REQUEST,
            FrontendError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            FrontendError::Auth(err) if err.is_rejection() => StatusCode::UNAUTHORIZED,
            FrontendError::Auth(_)
            | FrontendError::DataStore(_)
            | FrontendError::Payment(_)
            | FrontendError::Session(_)
            | FrontendError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Builds the login URL, carrying the page to come back to when there is one.
pub fn login_url(return_to: Option<&str>) -> String {
    match return_to {
        Some(dest) if !dest.is_empty() => {
            let encoded: String = url::form_urlencoded::byte_serialize(dest.as_bytes()).collect();
            format!("{}?dest={}", LOGIN_PATH, encoded)
        }
        _ => LOGIN_PATH.to_string(),
    }
}

impl IntoResponse for FrontendError {
    fn into_response(self) -> Response {
        match self {
            FrontendError::Unauthenticated { return_to } => {
                Redirect::to(&login_url(return_to.as_deref())).into_response()
            }
            other => other.status_code().into_response(),
        }
    }
}

pub type FrontendResult<T> = Result<T, FrontendError>;

/// Failures building the service; the process cannot serve without these.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("compiling templates: {0}")]
    Template(#[from] TemplateError),
    #[error("loading translations: {0}")]
    Localization(#[from] LocalizationError),
}
