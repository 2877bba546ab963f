use serde::{Deserialize, Serialize};

use super::{require_non_empty, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidPreparation {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub icon_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidPreparationFields {
    pub name: String,
    pub description: String,
    pub icon_path: String,
}

pub type ValidPreparationCreationInput = ValidPreparationFields;
pub type ValidPreparationUpdateInput = ValidPreparationFields;

impl Validate for ValidPreparationFields {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Entity for ValidPreparation {
    type Owner = Unowned;
    type CreationInput = ValidPreparationCreationInput;
    type UpdateInput = ValidPreparationUpdateInput;

    const RESOURCE: &'static str = "valid_preparations";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &ValidPreparationUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Name", &mut self.name, &input.name)
            .set("Description", &mut self.description, &input.description)
            .set("IconPath", &mut self.icon_path, &input.icon_path);
        tracker.finish()
    }
}
