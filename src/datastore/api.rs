use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::{DataStoreError, EntityDataManager, EntitySearcher, Fake, ManagerSource};
use crate::config::BackendConfig;
use crate::filter::QueryFilter;
use crate::types::{Entity, FieldChangeSummary, Ownership, QueryResult};

/// Header carrying the acting user's id on writes.
pub const REQUESTER_HEADER: &str = "X-Prixfixe-Requester";

const API_PREFIX: &str = "/api/v1";

/// Shared HTTP client for the backend API.
#[derive(Debug, Clone)]
pub struct ApiBackend {
    client: Client,
    base_url: String,
}

impl ApiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, DataStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataStoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Sends a request and decodes a JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DataStoreError> {
        let response = Self::checked(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DataStoreError::Decode(e.to_string()))
    }

    /// Sends a request whose body we don't need.
    pub async fn execute(&self, request: RequestBuilder) -> Result<(), DataStoreError> {
        Self::checked(request).await.map(|_| ())
    }

    async fn checked(request: RequestBuilder) -> Result<reqwest::Response, DataStoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| DataStoreError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(DataStoreError::NotFound),
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(DataStoreError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

impl ManagerSource for ApiBackend {
    fn manager<E: Fake>(&self) -> Arc<dyn EntityDataManager<E>> {
        Arc::new(ApiEntityManager::<E>::new(self.clone()))
    }

    fn searcher<E: Fake>(&self) -> Arc<dyn EntitySearcher<E>> {
        Arc::new(ApiEntityManager::<E>::new(self.clone()))
    }
}

/// Backend-API manager for any entity, addressed by its resource path.
pub struct ApiEntityManager<E> {
    backend: ApiBackend,
    _phantom: PhantomData<fn() -> E>,
}

impl<E: Entity> ApiEntityManager<E> {
    pub fn new(backend: ApiBackend) -> Self {
        Self {
            backend,
            _phantom: PhantomData,
        }
    }

    fn collection_url(&self, owner: &E::Owner) -> String {
        self.backend.url(&format!("{}/{}", owner.path_prefix(), E::RESOURCE))
    }

    fn record_url(&self, owner: &E::Owner, id: u64) -> String {
        format!("{}/{}", self.collection_url(owner), id)
    }
}

#[derive(Serialize)]
struct UpdateRequest<'a, E> {
    entity: &'a E,
    changes: &'a [FieldChangeSummary],
}

#[async_trait]
impl<E: Entity> EntityDataManager<E> for ApiEntityManager<E> {
    async fn get(&self, owner: &E::Owner, id: u64) -> Result<E, DataStoreError> {
        let request = self.backend.client().get(self.record_url(owner, id));
        self.backend.fetch(request).await
    }

    async fn list(&self, owner: &E::Owner, filter: &QueryFilter) -> Result<QueryResult<E>, DataStoreError> {
        let request = self
            .backend
            .client()
            .get(self.collection_url(owner))
            .query(&filter.to_query_pairs());
        self.backend.fetch(request).await
    }

    async fn create(&self, owner: &E::Owner, input: &E::CreationInput, requester_id: u64) -> Result<E, DataStoreError> {
        let request = self
            .backend
            .client()
            .post(self.collection_url(owner))
            .header(REQUESTER_HEADER, requester_id)
            .json(input);
        self.backend.fetch(request).await
    }

    async fn update(
        &self,
        owner: &E::Owner,
        entity: &E,
        requester_id: u64,
        changes: &[FieldChangeSummary],
    ) -> Result<(), DataStoreError> {
        let request = self
            .backend
            .client()
            .put(self.record_url(owner, entity.id()))
            .header(REQUESTER_HEADER, requester_id)
            .json(&UpdateRequest { entity, changes });
        self.backend.execute(request).await
    }

    async fn archive(&self, owner: &E::Owner, id: u64, requester_id: u64) -> Result<(), DataStoreError> {
        let request = self
            .backend
            .client()
            .delete(self.record_url(owner, id))
            .header(REQUESTER_HEADER, requester_id);
        self.backend.execute(request).await
    }
}

#[async_trait]
impl<E: Entity> EntitySearcher<E> for ApiEntityManager<E> {
    async fn search(&self, query: &str) -> Result<Vec<E>, DataStoreError> {
        let request = self
            .backend
            .client()
            .get(self.backend.url(&format!("/{}/search", E::RESOURCE)))
            .query(&[("q", query)]);
        self.backend.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountOwned, Invitation, RecipeStepIngredient, RecipeStepOwned};

    fn backend() -> ApiBackend {
        ApiBackend::new(&BackendConfig {
            base_url: "http://backend:8888/".to_string(),
            timeout_secs: 1,
        })
        .unwrap()
    }

    #[test]
    fn urls_follow_ownership() {
        let invitations = ApiEntityManager::<Invitation>::new(backend());
        assert_eq!(
            invitations.record_url(&AccountOwned { account_id: 3 }, 9),
            "http://backend:8888/api/v1/invitations/9"
        );

        let ingredients = ApiEntityManager::<RecipeStepIngredient>::new(backend());
        let owner = RecipeStepOwned {
            recipe_id: 1,
            recipe_step_id: 2,
        };
        assert_eq!(
            ingredients.collection_url(&owner),
            "http://backend:8888/api/v1/recipes/1/recipe_steps/2/recipe_step_ingredients"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let backend = ApiBackend::new(&BackendConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        let invitations = ApiEntityManager::<Invitation>::new(backend);

        let err = invitations.get(&AccountOwned { account_id: 1 }, 1).await.unwrap_err();
        assert!(matches!(err, DataStoreError::Unavailable(_)));
    }
}
