//! Signed session tokens carried in the browser's session cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::types::SessionContextData;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub session: SessionContextData,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(session: SessionContextData, max_age_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(max_age_hours as i64)).timestamp();

        Self {
            session,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("no session present on request")]
    Missing,
    #[error("session secret not configured")]
    SecretNotConfigured,
    #[error("invalid session token: {0}")]
    Invalid(String),
    #[error("session token generation failed: {0}")]
    Generation(String),
}

pub fn generate_session_token(session: SessionContextData, config: &SessionConfig) -> Result<String, SessionError> {
    if config.secret.is_empty() {
        return Err(SessionError::SecretNotConfigured);
    }

    let claims = Claims::new(session, config.max_age_hours);
    let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());

    encode(&Header::default(), &claims, &encoding_key).map_err(|e| SessionError::Generation(e.to_string()))
}

pub fn decode_session_token(token: &str, config: &SessionConfig) -> Result<SessionContextData, SessionError> {
    if config.secret.is_empty() {
        return Err(SessionError::SecretNotConfigured);
    }

    let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| SessionError::Invalid(e.to_string()))?;

    Ok(token_data.claims.session)
}

/// `Set-Cookie` value that stores a session token.
pub fn session_cookie(token: &str, config: &SessionConfig) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        token,
        config.max_age_hours * 3600
    )
}

/// `Set-Cookie` value that clears the session.
pub fn expired_session_cookie(config: &SessionConfig) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", config.cookie_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session_with_roles, test_config};
    use crate::types::session::SERVICE_ADMIN_ROLE;

    #[test]
    fn token_round_trips_the_session() {
        let config = test_config().session;
        let session = session_with_roles(&[SERVICE_ADMIN_ROLE]);

        let token = generate_session_token(session.clone(), &config).unwrap();
        assert_eq!(decode_session_token(&token, &config).unwrap(), session);
    }

    #[test]
    fn tampered_tokens_are_rejected() {
        let config = test_config().session;
        let token = generate_session_token(session_with_roles(&[]), &config).unwrap();

        let mut other = config.clone();
        other.secret = "a different secret".into();
        assert!(matches!(decode_session_token(&token, &other), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn empty_secret_is_refused() {
        let mut config = test_config().session;
        config.secret.clear();
        assert!(matches!(
            generate_session_token(session_with_roles(&[]), &config),
            Err(SessionError::SecretNotConfigured)
        ));
    }

    #[test]
    fn cookie_strings() {
        let config = test_config().session;
        assert!(session_cookie("abc", &config).starts_with(&format!("{}=abc;", config.cookie_name)));
        assert!(expired_session_cookie(&config).contains("Max-Age=0"));
    }
}
