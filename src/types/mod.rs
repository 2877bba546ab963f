//! Entity contract shared by the data store and the handler factory, plus the
//! records every entity module builds on.

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod ownership;
pub mod session;

pub mod account;
pub mod api_client;
pub mod invitation;
pub mod recipe;
pub mod recipe_step;
pub mod recipe_step_ingredient;
pub mod recipe_step_product;
pub mod report;
pub mod user;
pub mod valid_ingredient;
pub mod valid_ingredient_preparation;
pub mod valid_instrument;
pub mod valid_preparation;
pub mod valid_preparation_instrument;
pub mod webhook;

pub use account::{Account, AccountCreationInput, AccountUpdateInput};
pub use api_client::{ApiClient, ApiClientCreationInput, ApiClientUpdateInput};
pub use invitation::{Invitation, InvitationCreationInput, InvitationUpdateInput};
pub use ownership::{AccountOwned, Ownership, RecipeOwned, RecipeStepOwned, Unowned};
pub use recipe::{Recipe, RecipeCreationInput, RecipeUpdateInput};
pub use recipe_step::{RecipeStep, RecipeStepCreationInput, RecipeStepUpdateInput};
pub use recipe_step_ingredient::{
    RecipeStepIngredient, RecipeStepIngredientCreationInput, RecipeStepIngredientUpdateInput,
};
pub use recipe_step_product::{RecipeStepProduct, RecipeStepProductCreationInput, RecipeStepProductUpdateInput};
pub use report::{Report, ReportCreationInput, ReportUpdateInput};
pub use session::{AccountPermissions, RequesterInfo, ServicePermissions, SessionContextData};
pub use user::{User, UserCreationInput, UserUpdateInput};
pub use valid_ingredient::{
    ValidIngredient, ValidIngredientCreationInput, ValidIngredientFields, ValidIngredientUpdateInput,
};
pub use valid_ingredient_preparation::{
    ValidIngredientPreparation, ValidIngredientPreparationCreationInput, ValidIngredientPreparationFields,
    ValidIngredientPreparationUpdateInput,
};
pub use valid_instrument::{
    ValidInstrument, ValidInstrumentCreationInput, ValidInstrumentFields, ValidInstrumentUpdateInput,
};
pub use valid_preparation::{
    ValidPreparation, ValidPreparationCreationInput, ValidPreparationFields, ValidPreparationUpdateInput,
};
pub use valid_preparation_instrument::{
    ValidPreparationInstrument, ValidPreparationInstrumentCreationInput, ValidPreparationInstrumentFields,
    ValidPreparationInstrumentUpdateInput,
};
pub use webhook::{Webhook, WebhookCreationInput, WebhookUpdateInput};

/// A domain record the frontend reads and writes through the data store.
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    type Owner: Ownership;
    type CreationInput: Validate + Serialize + Clone + Debug + PartialEq + Send + Sync + 'static;
    type UpdateInput: Validate + Serialize + Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Path segment the backend API serves this entity under.
    const RESOURCE: &'static str;

    fn id(&self) -> u64;

    /// Applies `input` in place and reports which fields actually changed.
    fn update(&mut self, input: &Self::UpdateInput) -> Vec<FieldChangeSummary>;
}

/// Semantic check every creation/update input carries.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Rejects empty or whitespace-only required strings.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "cannot be blank"))
    } else {
        Ok(())
    }
}

/// Rejects zero identifiers.
pub fn require_id(field: &'static str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        Err(ValidationError::new(field, "must be set"))
    } else {
        Ok(())
    }
}

/// One field's before/after values from an entity update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChangeSummary {
    pub field_name: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Collects field changes while an entity is updated from an input.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    changes: Vec<FieldChangeSummary>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `new` to `current` when they differ, recording the change.
    pub fn set<T>(&mut self, field_name: &str, current: &mut T, new: &T) -> &mut Self
    where
        T: PartialEq + Clone + Serialize,
    {
        if current != new {
            self.changes.push(FieldChangeSummary {
                field_name: field_name.to_string(),
                old_value: serde_json::to_value(&*current).unwrap_or(Value::Null),
                new_value: serde_json::to_value(new).unwrap_or(Value::Null),
            });
            *current = new.clone();
        }
        self
    }

    pub fn finish(self) -> Vec<FieldChangeSummary> {
        self.changes
    }
}

/// A page of entities plus where it sits in the full result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<E> {
    pub data: Vec<E>,
    #[serde(flatten)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u8,
    pub filtered_count: u64,
    pub total_count: u64,
}

impl<E> QueryResult<E> {
    pub fn new(data: Vec<E>, pagination: Pagination) -> Self {
        Self { data, pagination }
    }

    /// Results that were never paged, such as search hits.
    pub fn unpaged(data: Vec<E>) -> Self {
        let count = data.len() as u64;
        let pagination = Pagination {
            page: 1,
            limit: u8::try_from(data.len()).unwrap_or(u8::MAX),
            filtered_count: count,
            total_count: count,
        };
        Self { data, pagination }
    }
}
