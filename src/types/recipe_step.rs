use serde::{Deserialize, Serialize};

use super::{require_id, ChangeTracker, Entity, FieldChangeSummary, RecipeOwned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    pub id: u64,
    pub index: u32,
    #[serde(rename = "preparationID")]
    pub preparation_id: u64,
    pub prerequisite_step: u64,
    pub min_estimated_time_in_seconds: u32,
    pub max_estimated_time_in_seconds: u32,
    #[serde(default)]
    pub temperature_in_celsius: Option<u16>,
    pub notes: String,
    pub why: String,
    pub created_on: u64,
    pub belongs_to_recipe: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepCreationInput {
    pub index: u32,
    #[serde(rename = "preparationID")]
    pub preparation_id: u64,
    pub prerequisite_step: u64,
    pub min_estimated_time_in_seconds: u32,
    pub max_estimated_time_in_seconds: u32,
    pub temperature_in_celsius: Option<u16>,
    pub notes: String,
    pub why: String,
    pub belongs_to_recipe: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepUpdateInput {
    pub index: u32,
    #[serde(rename = "preparationID")]
    pub preparation_id: u64,
    pub prerequisite_step: u64,
    pub min_estimated_time_in_seconds: u32,
    pub max_estimated_time_in_seconds: u32,
    pub temperature_in_celsius: Option<u16>,
    pub notes: String,
    pub why: String,
}

fn validate_timing(preparation_id: u64, min_seconds: u32, max_seconds: u32) -> Result<(), ValidationError> {
    require_id("preparationID", preparation_id)?;
    if min_seconds > max_seconds {
        return Err(ValidationError::new(
            "minEstimatedTimeInSeconds",
            "cannot exceed the maximum estimate",
        ));
    }
    Ok(())
}

impl Validate for RecipeStepCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_timing(
            self.preparation_id,
            self.min_estimated_time_in_seconds,
            self.max_estimated_time_in_seconds,
        )?;
        require_id("belongsToRecipe", self.belongs_to_recipe)
    }
}

impl Validate for RecipeStepUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_timing(
            self.preparation_id,
            self.min_estimated_time_in_seconds,
            self.max_estimated_time_in_seconds,
        )
    }
}

impl Entity for RecipeStep {
    type Owner = RecipeOwned;
    type CreationInput = RecipeStepCreationInput;
    type UpdateInput = RecipeStepUpdateInput;

    const RESOURCE: &'static str = "recipe_steps";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &RecipeStepUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Index", &mut self.index, &input.index)
            .set("PreparationID", &mut self.preparation_id, &input.preparation_id)
            .set("PrerequisiteStep", &mut self.prerequisite_step, &input.prerequisite_step)
            .set(
                "MinEstimatedTimeInSeconds",
                &mut self.min_estimated_time_in_seconds,
                &input.min_estimated_time_in_seconds,
            )
            .set(
                "MaxEstimatedTimeInSeconds",
                &mut self.max_estimated_time_in_seconds,
                &input.max_estimated_time_in_seconds,
            )
            .set("TemperatureInCelsius", &mut self.temperature_in_celsius, &input.temperature_in_celsius)
            .set("Notes", &mut self.notes, &input.notes)
            .set("Why", &mut self.why, &input.why);
        tracker.finish()
    }
}
