//! The handler shapes every entity shares.
//!
//! An entity opts in by implementing [`EntityAdapter`]: display names, how a
//! form becomes its inputs, and how an owner is stamped onto a new record.
//! [`routes`] then mounts creator, table and editor views (each as a full page
//! and as a fragment) plus the create, update and archive submissions.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{request::Parts, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tracing::{Instrument, Span};

use super::{Composition, Fragment, FullPage, Render, Service};
use crate::datastore::{DataStore, EntitySearcher, Managed};
use crate::error::{FrontendError, FrontendResult};
use crate::filter::QueryFilter;
use crate::forms::{extract_form_from_request, FormValues};
use crate::i18n::LanguageChoice;
use crate::observability::{acknowledge, request_span, Acknowledge};
use crate::templates::{FuncMap, Helper};
use crate::types::ownership::parse_id_param;
use crate::types::{Ownership, QueryResult, SessionContextData, Validate};

/// Header the hypermedia client follows instead of `Location`.
pub const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

/// Path parameter naming a record unless the entity picks its own.
pub const DEFAULT_ID_PARAM: &str = "id";

/// Query argument that switches a searchable table into search mode.
pub const SEARCH_QUERY_KEY: &str = "q";

/// What the shared handlers need to know about one entity.
pub trait EntityAdapter: Managed {
    /// Display name, e.g. `Recipe Step Ingredient`.
    const SINGULAR: &'static str;
    const PLURAL: &'static str;
    /// Snake-case name the creator and editor partials are keyed by.
    const TEMPLATE_NAME: &'static str;
    /// Router parameter for the record id. Entities that parent other routes
    /// name it after themselves so nested patterns agree on the segment.
    const ID_PARAM: &'static str = DEFAULT_ID_PARAM;

    fn creation_input(form: &FormValues) -> Self::CreationInput;

    fn update_input(form: &FormValues) -> Self::UpdateInput;

    /// Stamps the owner onto a creation input. Runs before validation.
    fn assign_owner(_input: &mut Self::CreationInput, _owner: &Self::Owner) {}

    /// Search used instead of the paged list when a table request carries `q`.
    fn table_searcher(_store: &DataStore) -> Option<Arc<dyn EntitySearcher<Self>>> {
        None
    }

    fn title(entity: &Self) -> String {
        format!("{} #{}", Self::SINGULAR, entity.id())
    }
}

/// Payload for a creator form: where it submits to.
#[derive(Debug, Serialize)]
pub struct CreatorForm {
    pub action: String,
}

pub fn collection_path<E: EntityAdapter>(owner: &E::Owner) -> String {
    format!("{}/{}", owner.path_prefix(), E::RESOURCE)
}

pub fn creator_partial<E: EntityAdapter>() -> String {
    format!("creators/{}_creator", E::TEMPLATE_NAME)
}

pub fn editor_partial<E: EntityAdapter>() -> String {
    format!("editors/{}_editor", E::TEMPLATE_NAME)
}

pub fn table_partial<E: EntityAdapter>() -> String {
    format!("tables/{}_table", E::RESOURCE)
}

/// `componentTitle`, `individualURL` and `pushURL` for records under `owner`,
/// plus the helpers every page gets.
pub fn entity_helpers<E: EntityAdapter>(service: &Service, language: LanguageChoice, owner: &E::Owner) -> FuncMap {
    let push_base = collection_path::<E>(owner);
    let individual_base = format!("/dashboard_pages{}", push_base);

    FuncMap::new()
        .with("componentTitle", Helper::caption::<E, _>(E::title))
        .with(
            "individualURL",
            Helper::link(move |e: &E| format!("{}/{}", individual_base, e.id())),
        )
        .with("pushURL", Helper::link(move |e: &E| format!("{}/{}", push_base, e.id())))
        .merged(&service.base_helpers(language))
}

type PathParams = Option<Path<HashMap<String, String>>>;

fn path_params(params: PathParams) -> HashMap<String, String> {
    params.map(|Path(p)| p).unwrap_or_default()
}

/// Session first, then the owner the route is scoped to.
fn begin<E: EntityAdapter>(
    service: &Service,
    parts: &Parts,
    params: &HashMap<String, String>,
) -> FrontendResult<(SessionContextData, E::Owner)> {
    let session = service.require_session(parts, None)?;
    let owner = E::Owner::resolve(&session, params).acknowledged("resolving owner")?;
    Ok((session, owner))
}

fn entity_id<E: EntityAdapter>(params: &HashMap<String, String>) -> FrontendResult<u64> {
    let id = parse_id_param(params, E::ID_PARAM).acknowledged("reading identifier from URL")?;
    Span::current().record("entity_id", id);
    Ok(id)
}

fn validated<I: Validate>(input: I, what: &str) -> FrontendResult<I> {
    match input.validate() {
        Ok(()) => Ok(input),
        Err(err) => {
            acknowledge(&err, what);
            Err(FrontendError::invalid_input(err.to_string()))
        }
    }
}

async fn read_form(parts: Parts, body: axum::body::Body) -> FrontendResult<FormValues> {
    Ok(extract_form_from_request(Request::from_parts(parts, body))
        .await
        .acknowledged("extracting form from request")?)
}

fn search_term(query: Option<&str>) -> Option<String> {
    FormValues::parse(query.unwrap_or("").as_bytes())
        .get(SEARCH_QUERY_KEY)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
}

pub async fn creator_view<E: EntityAdapter, C: Composition>(
    State(service): State<Arc<Service>>,
    params: PathParams,
    request: Request,
) -> Response {
    let span = request_span(E::RESOURCE, "creator", request.method(), request.uri());
    render_creator::<E, C>(&service, path_params(params), request)
        .instrument(span)
        .await
        .into_response()
}

async fn render_creator<E: EntityAdapter, C: Composition>(
    service: &Service,
    params: HashMap<String, String>,
    request: Request,
) -> FrontendResult<Response> {
    let (parts, _) = request.into_parts();
    let (session, owner) = begin::<E>(service, &parts, &params)?;
    let language = service.language(&parts.headers);

    C::compose(
        service,
        Render {
            partial: &creator_partial::<E>(),
            helpers: entity_helpers::<E>(service, language, &owner),
            title: format!("New {}", E::SINGULAR),
            session: Some(&session),
            payload: CreatorForm {
                action: collection_path::<E>(&owner),
            },
        },
    )
}

pub async fn editor_view<E: EntityAdapter, C: Composition>(
    State(service): State<Arc<Service>>,
    params: PathParams,
    request: Request,
) -> Response {
    let span = request_span(E::RESOURCE, "editor", request.method(), request.uri());
    render_editor::<E, C>(&service, path_params(params), request)
        .instrument(span)
        .await
        .into_response()
}

async fn render_editor<E: EntityAdapter, C: Composition>(
    service: &Service,
    params: HashMap<String, String>,
    request: Request,
) -> FrontendResult<Response> {
    let (parts, _) = request.into_parts();
    let (session, owner) = begin::<E>(service, &parts, &params)?;
    let id = entity_id::<E>(&params)?;

    let entity = E::manager(&service.data_store)
        .get(&owner, id)
        .await
        .acknowledged("fetching record for editor")?;

    C::compose(
        service,
        Render {
            partial: &editor_partial::<E>(),
            helpers: entity_helpers::<E>(service, service.language(&parts.headers), &owner),
            title: E::title(&entity),
            session: Some(&session),
            payload: entity,
        },
    )
}

pub async fn table_view<E: EntityAdapter, C: Composition>(
    State(service): State<Arc<Service>>,
    params: PathParams,
    request: Request,
) -> Response {
    let span = request_span(E::RESOURCE, "table", request.method(), request.uri());
    render_table::<E, C>(&service, path_params(params), request)
        .instrument(span)
        .await
        .into_response()
}

async fn render_table<E: EntityAdapter, C: Composition>(
    service: &Service,
    params: HashMap<String, String>,
    request: Request,
) -> FrontendResult<Response> {
    let (parts, _) = request.into_parts();
    let (session, owner) = begin::<E>(service, &parts, &params)?;
    let query = parts.uri.query();

    let results = match (search_term(query), E::table_searcher(&service.data_store)) {
        (Some(term), Some(searcher)) => {
            tracing::debug!(term = %term, "table in search mode");
            let found = searcher.search(&term).await.acknowledged("searching records")?;
            QueryResult::unpaged(found)
        }
        _ => E::manager(&service.data_store)
            .list(&owner, &QueryFilter::from_query(query))
            .await
            .acknowledged("fetching records for table")?,
    };

    C::compose(
        service,
        Render {
            partial: &table_partial::<E>(),
            helpers: entity_helpers::<E>(service, service.language(&parts.headers), &owner),
            title: E::PLURAL.to_string(),
            session: Some(&session),
            payload: results,
        },
    )
}

pub async fn create<E: EntityAdapter>(
    State(service): State<Arc<Service>>,
    params: PathParams,
    request: Request,
) -> Response {
    let span = request_span(E::RESOURCE, "create", request.method(), request.uri());
    handle_create::<E>(&service, path_params(params), request)
        .instrument(span)
        .await
        .into_response()
}

async fn handle_create<E: EntityAdapter>(
    service: &Service,
    params: HashMap<String, String>,
    request: Request,
) -> FrontendResult<Response> {
    let (parts, body) = request.into_parts();
    let (session, owner) = begin::<E>(service, &parts, &params)?;
    let form = read_form(parts, body).await?;

    let mut input = E::creation_input(&form);
    E::assign_owner(&mut input, &owner);
    let input = validated(input, "validating creation input")?;

    let created = E::manager(&service.data_store)
        .create(&owner, &input, session.requester.user_id)
        .await
        .acknowledged("creating record")?;
    Span::current().record("entity_id", created.id());
    tracing::info!("record created");

    Ok((StatusCode::CREATED, [(HX_REDIRECT, collection_path::<E>(&owner))]).into_response())
}

pub async fn update<E: EntityAdapter>(
    State(service): State<Arc<Service>>,
    params: PathParams,
    request: Request,
) -> Response {
    let span = request_span(E::RESOURCE, "update", request.method(), request.uri());
    handle_update::<E>(&service, path_params(params), request)
        .instrument(span)
        .await
        .into_response()
}

async fn handle_update<E: EntityAdapter>(
    service: &Service,
    params: HashMap<String, String>,
    request: Request,
) -> FrontendResult<Response> {
    let (parts, body) = request.into_parts();
    let (session, owner) = begin::<E>(service, &parts, &params)?;
    let id = entity_id::<E>(&params)?;
    let language = service.language(&parts.headers);

    let form = read_form(parts, body).await?;
    let input = validated(E::update_input(&form), "validating update input")?;

    let manager = E::manager(&service.data_store);
    let mut entity = manager.get(&owner, id).await.acknowledged("fetching record to update")?;

    // An empty change list is still sent on.
    let changes = entity.update(&input);
    tracing::debug!(changes = changes.len(), "applying update");
    manager
        .update(&owner, &entity, session.requester.user_id, &changes)
        .await
        .acknowledged("updating record")?;

    Fragment::compose(
        service,
        Render {
            partial: &editor_partial::<E>(),
            helpers: entity_helpers::<E>(service, language, &owner),
            title: E::title(&entity),
            session: Some(&session),
            payload: entity,
        },
    )
}

pub async fn archive<E: EntityAdapter>(
    State(service): State<Arc<Service>>,
    params: PathParams,
    request: Request,
) -> Response {
    let span = request_span(E::RESOURCE, "archive", request.method(), request.uri());
    handle_archive::<E>(&service, path_params(params), request)
        .instrument(span)
        .await
        .into_response()
}

async fn handle_archive<E: EntityAdapter>(
    service: &Service,
    params: HashMap<String, String>,
    request: Request,
) -> FrontendResult<Response> {
    let (parts, _) = request.into_parts();
    let (session, owner) = begin::<E>(service, &parts, &params)?;
    let id = entity_id::<E>(&params)?;

    let manager = E::manager(&service.data_store);
    manager
        .archive(&owner, id, session.requester.user_id)
        .await
        .acknowledged("archiving record")?;

    // The archive stands even if the list below cannot be read.
    let remaining = manager
        .list(&owner, &QueryFilter::from_query(parts.uri.query()))
        .await
        .acknowledged("fetching records after archive")?;

    Fragment::compose(
        service,
        Render {
            partial: &table_partial::<E>(),
            helpers: entity_helpers::<E>(service, service.language(&parts.headers), &owner),
            title: E::PLURAL.to_string(),
            session: Some(&session),
            payload: remaining,
        },
    )
}

/// Every route for `E`, scoped under its owner's prefix.
pub fn routes<E: EntityAdapter>() -> Router<Arc<Service>> {
    let collection = format!("{}/{}", <E::Owner as Ownership>::ROUTE_PREFIX, E::RESOURCE);
    let dashboard = format!("/dashboard_pages{}", collection);

    Router::new()
        .route(&format!("{}/new", collection), get(creator_view::<E, FullPage>))
        .route(&format!("{}/new", dashboard), get(creator_view::<E, Fragment>))
        .route(&collection, get(table_view::<E, FullPage>).post(create::<E>))
        .route(&dashboard, get(table_view::<E, Fragment>))
        .route(
            &format!("{}/:{}", collection, E::ID_PARAM),
            get(editor_view::<E, FullPage>).put(update::<E>).delete(archive::<E>),
        )
        .route(&format!("{}/:{}", dashboard, E::ID_PARAM), get(editor_view::<E, Fragment>))
}
