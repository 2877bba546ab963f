//! Test doubles and builders shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};

use crate::config::FrontendConfig;
use crate::datastore::{DataStore, DataStoreError, EntityDataManager, EntitySearcher, Fake, ManagerSource};
use crate::filter::QueryFilter;
use crate::handlers::Service;
use crate::middleware::SessionFetcher;
use crate::panicker::Panicker;
use crate::services::{
    AuthError, AuthService, CheckoutSession, LoginInput, PaymentError, PaymentManager, RegistrationInput,
    TotpVerificationInput,
};
use crate::auth::SessionError;
use crate::types::{
    AccountPermissions, Entity, FieldChangeSummary, QueryResult, RequesterInfo, ServicePermissions,
    SessionContextData,
};
use crate::types::session::ACCOUNT_ADMIN_ROLE;

pub const TEST_USER_ID: u64 = 123;
pub const TEST_ACCOUNT_ID: u64 = 456;

/// Remembers every loud failure instead of unwinding.
#[derive(Debug, Default)]
pub struct RecordingPanicker {
    calls: Mutex<Vec<String>>,
}

impl RecordingPanicker {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Panicker for RecordingPanicker {
    fn panic(&self, message: String) {
        self.calls.lock().unwrap().push(message);
    }
}

pub fn test_config() -> FrontendConfig {
    let mut config = FrontendConfig::default();
    config.use_fake_data = false;
    config.session.secret = "test-session-secret".to_string();
    config.session.cookie_name = "prixfixe_test".to_string();
    config
}

pub fn session_with_roles(service_roles: &[&str]) -> SessionContextData {
    SessionContextData {
        requester: RequesterInfo {
            user_id: TEST_USER_ID,
            reputation: "good".to_string(),
            reputation_explanation: String::new(),
            service_permissions: ServicePermissions::new(service_roles.iter().copied()),
        },
        active_account_id: TEST_ACCOUNT_ID,
        account_permissions: HashMap::from([(
            TEST_ACCOUNT_ID,
            AccountPermissions {
                account_roles: vec![ACCOUNT_ADMIN_ROLE.to_string()],
            },
        )]),
    }
}

pub fn fixed_session_fetcher(session: SessionContextData) -> SessionFetcher {
    Arc::new(move |_| Ok(session.clone()))
}

pub fn failing_session_fetcher() -> SessionFetcher {
    Arc::new(|_| Err(SessionError::Missing))
}

/// What a [`MockEntityStore`] was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall<E: Entity> {
    Get { owner: E::Owner, id: u64 },
    List { owner: E::Owner, filter: QueryFilter },
    Create { owner: E::Owner, input: E::CreationInput, requester_id: u64 },
    Update { entity: E, requester_id: u64, changes: Vec<FieldChangeSummary> },
    Archive { owner: E::Owner, id: u64, requester_id: u64 },
    Search { query: String },
}

/// Entity store that answers from scripted results and records its calls.
/// An unscripted call fails the test.
pub struct MockEntityStore<E: Entity> {
    gets: Mutex<VecDeque<Result<E, DataStoreError>>>,
    lists: Mutex<VecDeque<Result<QueryResult<E>, DataStoreError>>>,
    creates: Mutex<VecDeque<Result<E, DataStoreError>>>,
    updates: Mutex<VecDeque<Result<(), DataStoreError>>>,
    archives: Mutex<VecDeque<Result<(), DataStoreError>>>,
    searches: Mutex<VecDeque<Result<Vec<E>, DataStoreError>>>,
    calls: Mutex<Vec<StoreCall<E>>>,
}

impl<E: Entity> Default for MockEntityStore<E> {
    fn default() -> Self {
        Self {
            gets: Mutex::default(),
            lists: Mutex::default(),
            creates: Mutex::default(),
            updates: Mutex::default(),
            archives: Mutex::default(),
            searches: Mutex::default(),
            calls: Mutex::default(),
        }
    }
}

fn next<T>(queue: &Mutex<VecDeque<T>>, what: &str) -> T {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("unexpected {} call on mock entity store", what))
}

impl<E: Entity> MockEntityStore<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_get(&self, result: Result<E, DataStoreError>) -> &Self {
        self.gets.lock().unwrap().push_back(result);
        self
    }

    pub fn expect_list(&self, result: Result<QueryResult<E>, DataStoreError>) -> &Self {
        self.lists.lock().unwrap().push_back(result);
        self
    }

    pub fn expect_create(&self, result: Result<E, DataStoreError>) -> &Self {
        self.creates.lock().unwrap().push_back(result);
        self
    }

    pub fn expect_update(&self, result: Result<(), DataStoreError>) -> &Self {
        self.updates.lock().unwrap().push_back(result);
        self
    }

    pub fn expect_archive(&self, result: Result<(), DataStoreError>) -> &Self {
        self.archives.lock().unwrap().push_back(result);
        self
    }

    pub fn expect_search(&self, result: Result<Vec<E>, DataStoreError>) -> &Self {
        self.searches.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall<E>> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: StoreCall<E>) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl<E: Entity> EntityDataManager<E> for MockEntityStore<E> {
    async fn get(&self, owner: &E::Owner, id: u64) -> Result<E, DataStoreError> {
        self.record(StoreCall::Get {
            owner: owner.clone(),
            id,
        });
        next(&self.gets, "get")
    }

    async fn list(&self, owner: &E::Owner, filter: &QueryFilter) -> Result<QueryResult<E>, DataStoreError> {
        self.record(StoreCall::List {
            owner: owner.clone(),
            filter: filter.clone(),
        });
        next(&self.lists, "list")
    }

    async fn create(&self, owner: &E::Owner, input: &E::CreationInput, requester_id: u64) -> Result<E, DataStoreError> {
        self.record(StoreCall::Create {
            owner: owner.clone(),
            input: input.clone(),
            requester_id,
        });
        next(&self.creates, "create")
    }

    async fn update(
        &self,
        _owner: &E::Owner,
        entity: &E,
        requester_id: u64,
        changes: &[FieldChangeSummary],
    ) -> Result<(), DataStoreError> {
        self.record(StoreCall::Update {
            entity: entity.clone(),
            requester_id,
            changes: changes.to_vec(),
        });
        next(&self.updates, "update")
    }

    async fn archive(&self, owner: &E::Owner, id: u64, requester_id: u64) -> Result<(), DataStoreError> {
        self.record(StoreCall::Archive {
            owner: owner.clone(),
            id,
            requester_id,
        });
        next(&self.archives, "archive")
    }
}

#[async_trait]
impl<E: Entity> EntitySearcher<E> for MockEntityStore<E> {
    async fn search(&self, query: &str) -> Result<Vec<E>, DataStoreError> {
        self.record(StoreCall::Search {
            query: query.to_string(),
        });
        next(&self.searches, "search")
    }
}

/// Hands out an empty [`MockEntityStore`] for every slot.
pub struct MockSource;

impl ManagerSource for MockSource {
    fn manager<E: Fake>(&self) -> Arc<dyn EntityDataManager<E>> {
        Arc::new(MockEntityStore::<E>::new())
    }

    fn searcher<E: Fake>(&self) -> Arc<dyn EntitySearcher<E>> {
        Arc::new(MockEntityStore::<E>::new())
    }
}

#[derive(Default)]
pub struct MockAuthService {
    pub logins: Mutex<VecDeque<Result<SessionContextData, AuthError>>>,
    pub registrations: Mutex<VecDeque<Result<(), AuthError>>>,
    pub login_inputs: Mutex<Vec<LoginInput>>,
    pub registration_inputs: Mutex<Vec<RegistrationInput>>,
    pub totp_verifications: Mutex<VecDeque<Result<(), AuthError>>>,
    pub totp_inputs: Mutex<Vec<TotpVerificationInput>>,
}

#[async_trait]
impl AuthService for MockAuthService {
    async fn login(&self, input: &LoginInput) -> Result<SessionContextData, AuthError> {
        self.login_inputs.lock().unwrap().push(input.clone());
        next(&self.logins, "login")
    }

    async fn register(&self, input: &RegistrationInput) -> Result<(), AuthError> {
        self.registration_inputs.lock().unwrap().push(input.clone());
        next(&self.registrations, "register")
    }

    async fn verify_totp_secret(&self, input: &TotpVerificationInput) -> Result<(), AuthError> {
        self.totp_inputs.lock().unwrap().push(input.clone());
        next(&self.totp_verifications, "verify_totp_secret")
    }
}

#[derive(Default)]
pub struct MockPaymentManager {
    pub results: Mutex<VecDeque<Result<CheckoutSession, PaymentError>>>,
    pub plans: Mutex<Vec<String>>,
}

impl MockPaymentManager {
    pub fn expect(&self, result: Result<CheckoutSession, PaymentError>) -> &Self {
        self.results.lock().unwrap().push_back(result);
        self
    }

    pub fn plans(&self) -> Vec<String> {
        self.plans.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentManager for MockPaymentManager {
    async fn create_checkout_session(&self, plan_id: &str) -> Result<CheckoutSession, PaymentError> {
        self.plans.lock().unwrap().push(plan_id.to_string());
        next(&self.results, "checkout")
    }
}

/// A service wired to mocks, logged in as a plain user.
pub fn test_service() -> Service {
    Service::new(
        test_config(),
        DataStore::build(&MockSource),
        Arc::new(MockAuthService::default()),
        Arc::new(MockPaymentManager::default()),
        Arc::new(RecordingPanicker::default()),
    )
    .expect("test service should build")
    .with_session_fetcher(fixed_session_fetcher(session_with_roles(&[])))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn form_request(method: Method, uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
