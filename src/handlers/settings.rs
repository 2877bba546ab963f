//! User, account and admin settings pages.

use std::sync::Arc;

use axum::{
    extract::State,
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tracing::Instrument;

use super::billing::{SubscriptionPlan, SUBSCRIPTION_PLANS};
use super::{Composition, Fragment, FullPage, Render, Service};
use crate::error::{FrontendError, FrontendResult};
use crate::observability::{request_span, Acknowledge};
use crate::types::{Account, Unowned};

pub const USER_SETTINGS_PATH: &str = "/user/settings";
pub const ACCOUNT_SETTINGS_PATH: &str = "/account/settings";
pub const ADMIN_SETTINGS_PATH: &str = "/admin/settings";

#[derive(Debug, Serialize)]
struct AccountSettings {
    account: Account,
    plans: &'static [SubscriptionPlan],
}

/// A link on the admin page; `label` is a translation key.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdminLink {
    pub path: &'static str,
    pub label: &'static str,
}

pub const ADMIN_LINKS: &[AdminLink] = &[
    AdminLink {
        path: "/users",
        label: "nav-users",
    },
    AdminLink {
        path: "/valid_ingredients",
        label: "nav-valid-ingredients",
    },
    AdminLink {
        path: "/valid_instruments",
        label: "nav-valid-instruments",
    },
    AdminLink {
        path: "/valid_preparations",
        label: "nav-valid-preparations",
    },
    AdminLink {
        path: "/valid_preparation_instruments",
        label: "nav-valid-preparation-instruments",
    },
    AdminLink {
        path: "/valid_ingredient_preparations",
        label: "nav-valid-ingredient-preparations",
    },
];

#[derive(Debug, Serialize)]
struct AdminSettings {
    links: &'static [AdminLink],
}

pub async fn user_settings<C: Composition>(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    let span = request_span("settings", "user", &parts.method, &parts.uri);
    render_user_settings::<C>(&service, &parts)
        .instrument(span)
        .await
        .into_response()
}

async fn render_user_settings<C: Composition>(service: &Service, parts: &Parts) -> FrontendResult<Response> {
    let session = service.require_session(parts, Some(USER_SETTINGS_PATH))?;

    let user = service
        .data_store
        .users
        .get(&Unowned, session.requester.user_id)
        .await
        .acknowledged("fetching user for settings")?;

    C::compose(
        service,
        Render {
            partial: "settings/user_settings",
            helpers: service.base_helpers(service.language(&parts.headers)),
            title: service.translate(service.language(&parts.headers), "nav-user-settings"),
            session: Some(&session),
            payload: user,
        },
    )
}

pub async fn account_settings<C: Composition>(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    let span = request_span("settings", "account", &parts.method, &parts.uri);
    render_account_settings::<C>(&service, &parts)
        .instrument(span)
        .await
        .into_response()
}

async fn render_account_settings<C: Composition>(service: &Service, parts: &Parts) -> FrontendResult<Response> {
    let session = service.require_session(parts, Some(ACCOUNT_SETTINGS_PATH))?;
    let language = service.language(&parts.headers);

    let account = service
        .data_store
        .accounts
        .get(&Unowned, session.active_account_id)
        .await
        .acknowledged("fetching account for settings")?;

    C::compose(
        service,
        Render {
            partial: "settings/account_settings",
            helpers: service.base_helpers(language),
            title: service.translate(language, "nav-account-settings"),
            session: Some(&session),
            payload: AccountSettings {
                account,
                plans: SUBSCRIPTION_PLANS,
            },
        },
    )
}

pub async fn admin_settings<C: Composition>(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    let span = request_span("settings", "admin", &parts.method, &parts.uri);
    render_admin_settings::<C>(&service, &parts)
        .instrument(span)
        .await
        .into_response()
}

async fn render_admin_settings<C: Composition>(service: &Service, parts: &Parts) -> FrontendResult<Response> {
    let session = service.require_session(parts, Some(ADMIN_SETTINGS_PATH))?;

    if !session.is_service_admin() {
        tracing::warn!(user_id = session.requester.user_id, "non-admin requested admin settings");
        return Err(FrontendError::unauthorized("service admin role required"));
    }

    let language = service.language(&parts.headers);
    C::compose(
        service,
        Render {
            partial: "settings/admin_settings",
            helpers: service.base_helpers(language),
            title: service.translate(language, "nav-admin-settings"),
            session: Some(&session),
            payload: AdminSettings { links: ADMIN_LINKS },
        },
    )
}

pub fn routes() -> Router<Arc<Service>> {
    Router::new()
        .route(USER_SETTINGS_PATH, get(user_settings::<FullPage>))
        .route("/dashboard_pages/user/settings", get(user_settings::<Fragment>))
        .route(ACCOUNT_SETTINGS_PATH, get(account_settings::<FullPage>))
        .route("/dashboard_pages/account/settings", get(account_settings::<Fragment>))
        .route(ADMIN_SETTINGS_PATH, get(admin_settings::<FullPage>))
        .route("/dashboard_pages/admin/settings", get(admin_settings::<Fragment>))
}
