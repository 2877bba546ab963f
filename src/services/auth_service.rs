use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::datastore::{ApiBackend, DataStoreError};
use crate::types::{require_id, require_non_empty, SessionContextData, Validate, ValidationError};

/// Authenticator apps emit six-digit codes.
pub const TOTP_TOKEN_LENGTH: usize = 6;

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("registration rejected: {0}")]
    RegistrationRejected(String),
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// True when the caller's credentials were refused, as opposed to the
    /// service failing.
    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::InvalidCredentials | AuthError::RegistrationRejected(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub totp_token: String,
}

impl Validate for LoginInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    pub username: String,
    pub password: String,
}

impl Validate for RegistrationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)
    }
}

/// Confirms a freshly issued two-factor secret with the first code it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotpVerificationInput {
    pub totp_token: String,
    #[serde(rename = "userID")]
    pub user_id: u64,
}

impl Validate for TotpVerificationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id("userID", self.user_id)?;
        let token = self.totp_token.trim();
        if token.len() != TOTP_TOKEN_LENGTH || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::new(
                "totpToken",
                format!("must be {} digits", TOTP_TOKEN_LENGTH),
            ));
        }
        Ok(())
    }
}

/// The upstream service that checks credentials and opens sessions.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, input: &LoginInput) -> Result<SessionContextData, AuthError>;

    async fn register(&self, input: &RegistrationInput) -> Result<(), AuthError>;

    async fn verify_totp_secret(&self, input: &TotpVerificationInput) -> Result<(), AuthError>;
}

pub struct ApiAuthService {
    backend: ApiBackend,
}

impl ApiAuthService {
    pub fn new(backend: ApiBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl AuthService for ApiAuthService {
    async fn login(&self, input: &LoginInput) -> Result<SessionContextData, AuthError> {
        let request = self.backend.client().post(self.backend.url("/users/login")).json(input);

        self.backend.fetch(request).await.map_err(|err| match err {
            DataStoreError::Rejected { status: 401, .. } | DataStoreError::Rejected { status: 403, .. } => {
                AuthError::InvalidCredentials
            }
            other => AuthError::Unavailable(other.to_string()),
        })
    }

    async fn register(&self, input: &RegistrationInput) -> Result<(), AuthError> {
        let request = self.backend.client().post(self.backend.url("/users")).json(input);

        self.backend.execute(request).await.map_err(|err| match err {
            DataStoreError::Rejected { status, message } if (400..500).contains(&status) => {
                AuthError::RegistrationRejected(message)
            }
            other => AuthError::Unavailable(other.to_string()),
        })
    }

    async fn verify_totp_secret(&self, input: &TotpVerificationInput) -> Result<(), AuthError> {
        let request = self
            .backend
            .client()
            .post(self.backend.url("/users/totp_secret/verify"))
            .json(input);

        self.backend.execute(request).await.map_err(|err| match err {
            DataStoreError::Rejected { status, .. } if (400..500).contains(&status) => AuthError::InvalidCredentials,
            other => AuthError::Unavailable(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verification(token: &str, user_id: u64) -> TotpVerificationInput {
        TotpVerificationInput {
            totp_token: token.to_string(),
            user_id,
        }
    }

    #[test]
    fn totp_tokens_are_six_digits() {
        assert!(verification("123456", 4).validate().is_ok());
        assert_eq!(verification("12345", 4).validate().unwrap_err().field, "totpToken");
        assert_eq!(verification("12345a", 4).validate().unwrap_err().field, "totpToken");
        assert_eq!(verification("123456", 0).validate().unwrap_err().field, "userID");
    }

    #[test]
    fn totp_verification_uses_backend_field_names() {
        let encoded = serde_json::to_value(verification("654321", 9)).unwrap();
        assert_eq!(encoded, serde_json::json!({ "totpToken": "654321", "userID": 9 }));
    }
}
