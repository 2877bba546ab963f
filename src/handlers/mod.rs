//! Browser-facing handlers and the service value they share.
//!
//! Every route runs against an `Arc<Service>`: compiled templates, the
//! localizer, the data store and the upstream collaborators are installed once
//! at construction and only read afterwards.

use std::sync::Arc;

use axum::{
    http::{header::ACCEPT_LANGUAGE, request::Parts, HeaderMap},
    response::Response,
    Router,
};
use serde::Serialize;

use crate::config::FrontendConfig;
use crate::datastore::DataStore;
use crate::error::{FrontendError, FrontendResult, StartupError};
use crate::i18n::{resolve_language, LanguageChoice, Localizer};
use crate::middleware::{default_session_fetcher, SessionFetcher};
use crate::observability::acknowledge;
use crate::panicker::Panicker;
use crate::services::{AuthService, PaymentManager};
use crate::templates::{render_template_to_response, FuncMap, Helper, PageData, TemplateRegistry};
use crate::types::SessionContextData;

pub mod adapters;
pub mod billing;
pub mod entity;
pub mod health;
pub mod home;
pub mod sessions;
pub mod settings;
pub mod statics;

pub use entity::EntityAdapter;

/// Shared state behind every route.
pub struct Service {
    pub config: Arc<FrontendConfig>,
    pub templates: Arc<TemplateRegistry>,
    pub localizer: Arc<Localizer>,
    pub data_store: DataStore,
    pub auth_service: Arc<dyn AuthService>,
    pub payment_manager: Arc<dyn PaymentManager>,
    pub session_fetcher: SessionFetcher,
    pub panicker: Arc<dyn Panicker>,
}

impl Service {
    /// Compiles templates and loads translations; either failing is fatal.
    pub fn new(
        config: FrontendConfig,
        data_store: DataStore,
        auth_service: Arc<dyn AuthService>,
        payment_manager: Arc<dyn PaymentManager>,
        panicker: Arc<dyn Panicker>,
    ) -> Result<Self, StartupError> {
        let templates = TemplateRegistry::new()?;
        let localizer = Localizer::new(Arc::clone(&panicker))?;

        Ok(Self {
            config: Arc::new(config),
            templates: Arc::new(templates),
            localizer: Arc::new(localizer),
            data_store,
            auth_service,
            payment_manager,
            session_fetcher: default_session_fetcher(),
            panicker,
        })
    }

    pub fn with_session_fetcher(mut self, session_fetcher: SessionFetcher) -> Self {
        self.session_fetcher = session_fetcher;
        self
    }

    /// The caller's session, or the redirect to the login page. `return_to`
    /// is carried on the login URL so the caller lands back where they were.
    pub fn require_session(&self, parts: &Parts, return_to: Option<&str>) -> FrontendResult<SessionContextData> {
        (self.session_fetcher)(parts).map_err(|err| {
            acknowledge(&err, "fetching session context");
            match return_to {
                Some(path) => FrontendError::unauthenticated_returning_to(path),
                None => FrontendError::unauthenticated(),
            }
        })
    }

    /// The caller's session if there is one.
    pub fn optional_session(&self, parts: &Parts) -> Option<SessionContextData> {
        match (self.session_fetcher)(parts) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::debug!(error = %err, "rendering without a session");
                None
            }
        }
    }

    pub fn language(&self, headers: &HeaderMap) -> LanguageChoice {
        resolve_language(headers.get(ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok()))
    }

    /// Helpers every template may call.
    pub fn base_helpers(&self, language: LanguageChoice) -> FuncMap {
        FuncMap::new()
            .with(
                "translate",
                Helper::Translate {
                    localizer: Arc::clone(&self.localizer),
                    language,
                },
            )
            .with("renderPrice", Helper::Price(Arc::clone(&self.panicker)))
            .with("formatTime", Helper::Time(Arc::clone(&self.panicker)))
    }

    pub fn translate(&self, language: LanguageChoice, message_id: &str) -> String {
        self.localizer.translate(language, message_id)
    }
}

/// A page request's rendering details, independent of composition.
pub struct Render<'a, T> {
    pub partial: &'a str,
    pub helpers: FuncMap,
    pub title: String,
    pub session: Option<&'a SessionContextData>,
    pub payload: T,
}

/// How a partial reaches the browser: framed by the base layout, or alone.
pub trait Composition: Send + Sync + 'static {
    const SHAPE: &'static str;

    fn compose<T: Serialize>(service: &Service, render: Render<'_, T>) -> FrontendResult<Response>;
}

/// The partial installed as the base layout's content.
pub struct FullPage;

/// The partial by itself, for in-page swaps.
pub struct Fragment;

impl Composition for FullPage {
    const SHAPE: &'static str = "page";

    fn compose<T: Serialize>(service: &Service, render: Render<'_, T>) -> FrontendResult<Response> {
        let tmpl = service
            .templates
            .render_template_into_base_template(render.partial, render.helpers)?;
        let page = PageData::new(render.title, render.session, render.payload);

        Ok(render_template_to_response(&tmpl, &page))
    }
}

impl Composition for Fragment {
    const SHAPE: &'static str = "fragment";

    fn compose<T: Serialize>(service: &Service, render: Render<'_, T>) -> FrontendResult<Response> {
        let tmpl = service.templates.parse_template(render.partial, render.helpers)?;
        Ok(render_template_to_response(&tmpl, &render.payload))
    }
}

/// Every frontend route, with the service as state.
pub fn router(service: Arc<Service>) -> Router {
    let static_dir = service.config.server.static_dir.clone();

    Router::new()
        .merge(home::routes())
        .merge(health::routes())
        .merge(sessions::routes())
        .merge(billing::routes())
        .merge(settings::routes())
        .merge(adapters::routes())
        .merge(statics::routes(&static_dir))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{failing_session_fetcher, get, test_service};
    use axum::http::Request;

    fn parts(uri: &str) -> Parts {
        get(uri).into_parts().0
    }

    #[test]
    fn session_failures_redirect_to_login() {
        let service = test_service().with_session_fetcher(failing_session_fetcher());

        let err = service.require_session(&parts("/accounts"), None).unwrap_err();
        assert!(matches!(err, FrontendError::Unauthenticated { return_to: None }));

        let err = service
            .require_session(&parts("/user/settings"), Some("/user/settings"))
            .unwrap_err();
        assert!(matches!(err, FrontendError::Unauthenticated { return_to: Some(ref p) } if p == "/user/settings"));

        assert!(service.optional_session(&parts("/")).is_none());
    }

    #[test]
    fn language_follows_accept_language() {
        let service = test_service();
        let req = Request::builder()
            .header(ACCEPT_LANGUAGE, "es-419")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();

        assert_eq!(service.language(&parts.headers).tag, "es-419");
        assert_eq!(service.language(&HeaderMap::new()).tag, "en-US");
    }

    #[test]
    fn base_helpers_are_bound() {
        let service = test_service();
        let helpers = service.base_helpers(crate::i18n::DEFAULT_LANGUAGE);
        for name in ["translate", "renderPrice", "formatTime"] {
            assert!(helpers.contains(name), "{} missing", name);
        }
    }
}
