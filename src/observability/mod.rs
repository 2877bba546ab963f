//! Logging setup and the request-scoped tracing helpers every handler uses.

use std::fmt::Display;

use axum::http::{Method, Uri};
use tracing::Span;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Installs the global fmt subscriber. `RUST_LOG` wins over the `debug` flag.
pub fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (tests, embedding) is not an error worth surfacing.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Opens the span a handler runs inside of.
pub fn request_span(component: &'static str, shape: &'static str, method: &Method, uri: &Uri) -> Span {
    tracing::info_span!(
        "frontend_request",
        component,
        shape,
        method = %method,
        uri = %uri,
        request_id = %Uuid::new_v4(),
        entity_id = tracing::field::Empty,
        error = tracing::field::Empty,
    )
}

/// Logs an error against the current request and flags its span.
pub fn acknowledge(err: &dyn Display, context: &str) {
    tracing::error!(error = %err, "{}", context);
    Span::current().record("error", true);
}

/// `Result` adapter that acknowledges the error branch before it propagates.
pub trait Acknowledge {
    fn acknowledged(self, context: &str) -> Self;
}

impl<T, E: Display> Acknowledge for Result<T, E> {
    fn acknowledged(self, context: &str) -> Self {
        if let Err(err) = &self {
            acknowledge(err, context);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acknowledged_passes_values_through() {
        let ok: Result<u8, String> = Ok(3);
        assert_eq!(ok.acknowledged("nothing"), Ok(3));

        let err: Result<u8, String> = Err("boom".into());
        assert_eq!(err.acknowledged("fetching thing"), Err("boom".to_string()));
    }
}
