use serde::{Deserialize, Serialize};

use super::{require_id, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidIngredientPreparation {
    pub id: u64,
    pub notes: String,
    #[serde(rename = "validIngredientID")]
    pub valid_ingredient_id: u64,
    #[serde(rename = "validPreparationID")]
    pub valid_preparation_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidIngredientPreparationFields {
    pub notes: String,
    #[serde(rename = "validIngredientID")]
    pub valid_ingredient_id: u64,
    #[serde(rename = "validPreparationID")]
    pub valid_preparation_id: u64,
}

pub type ValidIngredientPreparationCreationInput = ValidIngredientPreparationFields;
pub type ValidIngredientPreparationUpdateInput = ValidIngredientPreparationFields;

impl Validate for ValidIngredientPreparationFields {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id("validIngredientID", self.valid_ingredient_id)?;
        require_id("validPreparationID", self.valid_preparation_id)
    }
}

impl Entity for ValidIngredientPreparation {
    type Owner = Unowned;
    type CreationInput = ValidIngredientPreparationCreationInput;
    type UpdateInput = ValidIngredientPreparationUpdateInput;

    const RESOURCE: &'static str = "valid_ingredient_preparations";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &ValidIngredientPreparationUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Notes", &mut self.notes, &input.notes)
            .set("ValidIngredientID", &mut self.valid_ingredient_id, &input.valid_ingredient_id)
            .set("ValidPreparationID", &mut self.valid_preparation_id, &input.valid_preparation_id);
        tracker.finish()
    }
}
