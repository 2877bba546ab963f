use serde::{Deserialize, Serialize};

use super::{require_non_empty, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: u64,
    pub name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub billing_status: String,
    #[serde(default)]
    pub subscription_plan_id: Option<u64>,
    pub created_on: u64,
    pub belongs_to_user: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreationInput {
    pub name: String,
    pub contact_email: String,
    pub contact_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdateInput {
    pub name: String,
    pub contact_email: String,
    pub contact_phone: String,
}

impl Validate for AccountCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Validate for AccountUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Entity for Account {
    type Owner = Unowned;
    type CreationInput = AccountCreationInput;
    type UpdateInput = AccountUpdateInput;

    const RESOURCE: &'static str = "accounts";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &AccountUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Name", &mut self.name, &input.name)
            .set("ContactEmail", &mut self.contact_email, &input.contact_email)
            .set("ContactPhone", &mut self.contact_phone, &input.contact_phone);
        tracker.finish()
    }
}
