//! Login, logout, registration and two-factor setup.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        request::Parts,
        StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tracing::Instrument;

use super::entity::HX_REDIRECT;
use super::{Composition, Fragment, FullPage, Render, Service};
use crate::auth::{expired_session_cookie, generate_session_token, session_cookie};
use crate::error::{FrontendError, FrontendResult, LOGIN_PATH};
use crate::forms::{extract_form_from_request, FormValues};
use crate::observability::{acknowledge, request_span, Acknowledge};
use crate::services::{LoginInput, RegistrationInput, TotpVerificationInput};
use crate::types::Validate;

const DEST_KEY: &str = "dest";

#[derive(Debug, Serialize)]
struct LoginPrompt {
    dest: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegistrationPrompt {}

/// Only same-site paths are followed after login.
fn safe_destination(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|d| d.starts_with('/') && !d.starts_with("//"))
        .map(str::to_string)
}

fn validated<I: Validate>(input: I, what: &str) -> FrontendResult<I> {
    input.validate().map_err(|err| {
        acknowledge(&err, what);
        FrontendError::invalid_input(err.to_string())
    })?;
    Ok(input)
}

async fn read_form(parts: Parts, body: Body) -> FrontendResult<FormValues> {
    Ok(extract_form_from_request(Request::from_parts(parts, body))
        .await
        .acknowledged("extracting form from request")?)
}

pub async fn login_view<C: Composition>(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    let _entered = request_span("sessions", "login_prompt", &parts.method, &parts.uri).entered();
    let query = FormValues::parse(parts.uri.query().unwrap_or("").as_bytes());
    let language = service.language(&parts.headers);

    C::compose(
        &service,
        Render {
            partial: "auth/login_prompt",
            helpers: service.base_helpers(language),
            title: service.translate(language, "nav-login"),
            session: None,
            payload: LoginPrompt {
                dest: safe_destination(query.get(DEST_KEY)),
            },
        },
    )
    .acknowledged("rendering login prompt")
    .into_response()
}

pub async fn registration_view<C: Composition>(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    let _entered = request_span("sessions", "registration_prompt", &parts.method, &parts.uri).entered();
    let language = service.language(&parts.headers);

    C::compose(
        &service,
        Render {
            partial: "auth/registration_prompt",
            helpers: service.base_helpers(language),
            title: service.translate(language, "nav-register"),
            session: None,
            payload: RegistrationPrompt {},
        },
    )
    .acknowledged("rendering registration prompt")
    .into_response()
}

pub async fn submit_login(State(service): State<Arc<Service>>, request: Request) -> Response {
    let span = request_span("sessions", "login", request.method(), request.uri());
    handle_login(&service, request).instrument(span).await.into_response()
}

async fn handle_login(service: &Service, request: Request) -> FrontendResult<Response> {
    let (parts, body) = request.into_parts();
    let form = read_form(parts, body).await?;

    let input = validated(
        LoginInput {
            username: form.value("username"),
            password: form.value("password"),
            totp_token: form.value("totpToken"),
        },
        "validating login input",
    )?;

    let session = service
        .auth_service
        .login(&input)
        .await
        .acknowledged("logging in")?;
    tracing::info!(user_id = session.requester.user_id, "user logged in");

    let token = generate_session_token(session, &service.config.session).acknowledged("signing session token")?;
    let dest = safe_destination(form.get(DEST_KEY)).unwrap_or_else(|| "/".to_string());

    Ok((
        StatusCode::OK,
        [
            (SET_COOKIE, session_cookie(&token, &service.config.session)),
            (HX_REDIRECT, dest),
        ],
    )
        .into_response())
}

pub async fn logout(State(service): State<Arc<Service>>, parts: Parts) -> Response {
    let _entered = request_span("sessions", "logout", &parts.method, &parts.uri).entered();
    tracing::info!("logging out");

    (
        StatusCode::SEE_OTHER,
        [
            (SET_COOKIE, expired_session_cookie(&service.config.session)),
            (LOCATION, "/".to_string()),
            (HX_REDIRECT, "/".to_string()),
        ],
    )
        .into_response()
}

pub async fn submit_registration(State(service): State<Arc<Service>>, request: Request) -> Response {
    let span = request_span("sessions", "registration", request.method(), request.uri());
    handle_registration(&service, request)
        .instrument(span)
        .await
        .into_response()
}

async fn handle_registration(service: &Service, request: Request) -> FrontendResult<Response> {
    let (parts, body) = request.into_parts();
    let form = read_form(parts, body).await?;

    let input = validated(
        RegistrationInput {
            username: form.value("username"),
            password: form.value("password"),
        },
        "validating registration input",
    )?;

    service
        .auth_service
        .register(&input)
        .await
        .acknowledged("registering user")?;
    tracing::info!(username = %input.username, "user registered");

    Ok((StatusCode::CREATED, [(HX_REDIRECT, LOGIN_PATH)]).into_response())
}

pub async fn submit_totp_verification(State(service): State<Arc<Service>>, request: Request) -> Response {
    let span = request_span("sessions", "totp_verification", request.method(), request.uri());
    handle_totp_verification(&service, request)
        .instrument(span)
        .await
        .into_response()
}

async fn handle_totp_verification(service: &Service, request: Request) -> FrontendResult<Response> {
    let (parts, body) = request.into_parts();
    let form = read_form(parts, body).await?;

    let input = validated(
        TotpVerificationInput {
            totp_token: form.value::<String>("totpToken").trim().to_string(),
            user_id: form.value("userID"),
        },
        "validating two factor verification input",
    )?;

    service
        .auth_service
        .verify_totp_secret(&input)
        .await
        .acknowledged("verifying two factor secret")?;
    tracing::info!(user_id = input.user_id, "two factor secret verified");

    Ok((StatusCode::ACCEPTED, [(HX_REDIRECT, LOGIN_PATH)]).into_response())
}

pub fn routes() -> Router<Arc<Service>> {
    Router::new()
        .route(LOGIN_PATH, get(login_view::<FullPage>))
        .route("/components/login_prompt", get(login_view::<Fragment>))
        .route("/register", get(registration_view::<FullPage>))
        .route("/components/registration_prompt", get(registration_view::<Fragment>))
        .route("/auth/submit_login", post(submit_login))
        .route("/auth/submit_registration", post(submit_registration))
        .route("/auth/verify_two_factor_secret", post(submit_totp_verification))
        .route("/logout", post(logout))
}
