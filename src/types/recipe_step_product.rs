use serde::{Deserialize, Serialize};

use super::{require_id, require_non_empty, ChangeTracker, Entity, FieldChangeSummary, RecipeStepOwned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepProduct {
    pub id: u64,
    pub name: String,
    pub quantity_type: String,
    pub quantity_value: f32,
    pub quantity_notes: String,
    pub belongs_to_recipe_step: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepProductCreationInput {
    pub name: String,
    pub quantity_type: String,
    pub quantity_value: f32,
    pub quantity_notes: String,
    pub belongs_to_recipe_step: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepProductUpdateInput {
    pub name: String,
    pub quantity_type: String,
    pub quantity_value: f32,
    pub quantity_notes: String,
}

impl Validate for RecipeStepProductCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("quantityType", &self.quantity_type)?;
        require_id("belongsToRecipeStep", self.belongs_to_recipe_step)
    }
}

impl Validate for RecipeStepProductUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("quantityType", &self.quantity_type)
    }
}

impl Entity for RecipeStepProduct {
    type Owner = RecipeStepOwned;
    type CreationInput = RecipeStepProductCreationInput;
    type UpdateInput = RecipeStepProductUpdateInput;

    const RESOURCE: &'static str = "recipe_step_products";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &RecipeStepProductUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Name", &mut self.name, &input.name)
            .set("QuantityType", &mut self.quantity_type, &input.quantity_type)
            .set("QuantityValue", &mut self.quantity_value, &input.quantity_value)
            .set("QuantityNotes", &mut self.quantity_notes, &input.quantity_notes);
        tracker.finish()
    }
}
