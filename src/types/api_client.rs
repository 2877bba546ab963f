use serde::{Deserialize, Serialize};

use super::{require_non_empty, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClient {
    pub id: u64,
    pub name: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub created_on: u64,
    pub belongs_to_user: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientCreationInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClientUpdateInput {
    pub name: String,
}

impl Validate for ApiClientCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Validate for ApiClientUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Entity for ApiClient {
    type Owner = Unowned;
    type CreationInput = ApiClientCreationInput;
    type UpdateInput = ApiClientUpdateInput;

    const RESOURCE: &'static str = "api_clients";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &ApiClientUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker.set("Name", &mut self.name, &input.name);
        tracker.finish()
    }
}
