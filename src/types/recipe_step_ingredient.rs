use serde::{Deserialize, Serialize};

use super::{require_id, require_non_empty, ChangeTracker, Entity, FieldChangeSummary, RecipeStepOwned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepIngredient {
    pub id: u64,
    #[serde(rename = "ingredientID", default)]
    pub ingredient_id: Option<u64>,
    pub name: String,
    pub quantity_type: String,
    pub quantity_value: f32,
    pub quantity_notes: String,
    pub product_of_recipe_step: bool,
    pub ingredient_notes: String,
    pub belongs_to_recipe_step: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepIngredientCreationInput {
    #[serde(rename = "ingredientID")]
    pub ingredient_id: Option<u64>,
    pub name: String,
    pub quantity_type: String,
    pub quantity_value: f32,
    pub quantity_notes: String,
    pub product_of_recipe_step: bool,
    pub ingredient_notes: String,
    pub belongs_to_recipe_step: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStepIngredientUpdateInput {
    #[serde(rename = "ingredientID")]
    pub ingredient_id: Option<u64>,
    pub name: String,
    pub quantity_type: String,
    pub quantity_value: f32,
    pub quantity_notes: String,
    pub product_of_recipe_step: bool,
    pub ingredient_notes: String,
}

fn validate_quantity(name: &str, quantity_type: &str, quantity_value: f32) -> Result<(), ValidationError> {
    require_non_empty("name", name)?;
    require_non_empty("quantityType", quantity_type)?;
    if !quantity_value.is_finite() || quantity_value < 0.0 {
        return Err(ValidationError::new("quantityValue", "must be a non-negative number"));
    }
    Ok(())
}

impl Validate for RecipeStepIngredientCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_quantity(&self.name, &self.quantity_type, self.quantity_value)?;
        require_id("belongsToRecipeStep", self.belongs_to_recipe_step)
    }
}

impl Validate for RecipeStepIngredientUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_quantity(&self.name, &self.quantity_type, self.quantity_value)
    }
}

impl Entity for RecipeStepIngredient {
    type Owner = RecipeStepOwned;
    type CreationInput = RecipeStepIngredientCreationInput;
    type UpdateInput = RecipeStepIngredientUpdateInput;

    const RESOURCE: &'static str = "recipe_step_ingredients";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &RecipeStepIngredientUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("IngredientID", &mut self.ingredient_id, &input.ingredient_id)
            .set("Name", &mut self.name, &input.name)
            .set("QuantityType", &mut self.quantity_type, &input.quantity_type)
            .set("QuantityValue", &mut self.quantity_value, &input.quantity_value)
            .set("QuantityNotes", &mut self.quantity_notes, &input.quantity_notes)
            .set("ProductOfRecipeStep", &mut self.product_of_recipe_step, &input.product_of_recipe_step)
            .set("IngredientNotes", &mut self.ingredient_notes, &input.ingredient_notes);
        tracker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient() -> RecipeStepIngredient {
        RecipeStepIngredient {
            id: 4,
            ingredient_id: Some(12),
            name: "flour".into(),
            quantity_type: "grams".into(),
            quantity_value: 250.0,
            quantity_notes: String::new(),
            product_of_recipe_step: false,
            ingredient_notes: "sifted".into(),
            belongs_to_recipe_step: 2,
        }
    }

    #[test]
    fn identical_input_changes_nothing() {
        let mut current = ingredient();
        let input = RecipeStepIngredientUpdateInput {
            ingredient_id: Some(12),
            name: "flour".into(),
            quantity_type: "grams".into(),
            quantity_value: 250.0,
            quantity_notes: String::new(),
            product_of_recipe_step: false,
            ingredient_notes: "sifted".into(),
        };
        assert!(current.update(&input).is_empty());
        assert_eq!(current, ingredient());
    }

    #[test]
    fn negative_quantities_are_invalid() {
        let input = RecipeStepIngredientUpdateInput {
            ingredient_id: None,
            name: "flour".into(),
            quantity_type: "grams".into(),
            quantity_value: -1.0,
            quantity_notes: String::new(),
            product_of_recipe_step: false,
            ingredient_notes: String::new(),
        };
        assert_eq!(input.validate().unwrap_err().field, "quantityValue");
    }
}
