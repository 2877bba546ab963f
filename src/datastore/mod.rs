//! Data store seam: the per-entity operations handlers consume, and the
//! bundle of managers installed on the service.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::filter::QueryFilter;
use crate::types::{
    Account, ApiClient, Entity, FieldChangeSummary, Invitation, QueryResult, Recipe, RecipeStep, RecipeStepIngredient,
    RecipeStepProduct, Report, User, ValidIngredient, ValidIngredientPreparation, ValidInstrument, ValidPreparation,
    ValidPreparationInstrument, Webhook,
};

pub mod api;
pub mod fake;

pub use api::{ApiBackend, ApiEntityManager};
pub use fake::{Fake, FakeEntityManager, FakeSearcher};

#[derive(Debug, Clone, Error)]
pub enum DataStoreError {
    #[error("record not found")]
    NotFound,
    #[error("data store unavailable: {0}")]
    Unavailable(String),
    #[error("data store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("decoding data store response: {0}")]
    Decode(String),
}

/// Reads and writes for one entity type.
#[async_trait]
pub trait EntityDataManager<E: Entity>: Send + Sync {
    async fn get(&self, owner: &E::Owner, id: u64) -> Result<E, DataStoreError>;

    async fn list(&self, owner: &E::Owner, filter: &QueryFilter) -> Result<QueryResult<E>, DataStoreError>;

    async fn create(&self, owner: &E::Owner, input: &E::CreationInput, requester_id: u64) -> Result<E, DataStoreError>;

    /// Persists an already-updated entity along with the changes that produced it.
    async fn update(
        &self,
        owner: &E::Owner,
        entity: &E,
        requester_id: u64,
        changes: &[FieldChangeSummary],
    ) -> Result<(), DataStoreError>;

    async fn archive(&self, owner: &E::Owner, id: u64, requester_id: u64) -> Result<(), DataStoreError>;
}

/// Free-text lookup for the entities that support it.
#[async_trait]
pub trait EntitySearcher<E: Entity>: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<E>, DataStoreError>;
}

/// Something that can hand out a manager and a searcher for any entity.
pub trait ManagerSource {
    fn manager<E: Fake>(&self) -> Arc<dyn EntityDataManager<E>>;
    fn searcher<E: Fake>(&self) -> Arc<dyn EntitySearcher<E>>;
}

/// Entities with a manager slot on the [`DataStore`].
pub trait Managed: Fake {
    fn manager(store: &DataStore) -> &Arc<dyn EntityDataManager<Self>>;
}

macro_rules! data_store {
    ($($field:ident: $entity:ty),* $(,)?) => {
        /// Every manager the frontend talks to, shared across requests.
        #[derive(Clone)]
        pub struct DataStore {
            $(pub $field: Arc<dyn EntityDataManager<$entity>>,)*
            pub user_search: Arc<dyn EntitySearcher<User>>,
            pub valid_preparation_search: Arc<dyn EntitySearcher<ValidPreparation>>,
        }

        impl DataStore {
            pub fn build(source: &impl ManagerSource) -> Self {
                Self {
                    $($field: source.manager::<$entity>(),)*
                    user_search: source.searcher::<User>(),
                    valid_preparation_search: source.searcher::<ValidPreparation>(),
                }
            }

            /// Replaces every read with generated data; writes still reach the
            /// wrapped managers.
            pub fn with_fake_reads(self) -> Self {
                Self {
                    $($field: Arc::new(FakeEntityManager::new(self.$field)),)*
                    user_search: Arc::new(FakeSearcher::<User>::default()),
                    valid_preparation_search: Arc::new(FakeSearcher::<ValidPreparation>::default()),
                }
            }
        }

        $(
            impl Managed for $entity {
                fn manager(store: &DataStore) -> &Arc<dyn EntityDataManager<Self>> {
                    &store.$field
                }
            }
        )*
    };
}

data_store! {
    accounts: Account,
    api_clients: ApiClient,
    users: User,
    webhooks: Webhook,
    invitations: Invitation,
    reports: Report,
    valid_ingredients: ValidIngredient,
    valid_instruments: ValidInstrument,
    valid_preparations: ValidPreparation,
    valid_preparation_instruments: ValidPreparationInstrument,
    valid_ingredient_preparations: ValidIngredientPreparation,
    recipes: Recipe,
    recipe_steps: RecipeStep,
    recipe_step_ingredients: RecipeStepIngredient,
    recipe_step_products: RecipeStepProduct,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore").finish_non_exhaustive()
    }
}
