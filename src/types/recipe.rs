use serde::{Deserialize, Serialize};

use super::{require_id, require_non_empty, AccountOwned, ChangeTracker, Entity, FieldChangeSummary, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: u64,
    pub name: String,
    pub source: String,
    pub description: String,
    #[serde(rename = "inspiredByRecipeID", default)]
    pub inspired_by_recipe_id: Option<u64>,
    pub created_on: u64,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeCreationInput {
    pub name: String,
    pub source: String,
    pub description: String,
    #[serde(rename = "inspiredByRecipeID")]
    pub inspired_by_recipe_id: Option<u64>,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeUpdateInput {
    pub name: String,
    pub source: String,
    pub description: String,
    #[serde(rename = "inspiredByRecipeID")]
    pub inspired_by_recipe_id: Option<u64>,
}

impl Validate for RecipeCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_id("belongsToAccount", self.belongs_to_account)
    }
}

impl Validate for RecipeUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Entity for Recipe {
    type Owner = AccountOwned;
    type CreationInput = RecipeCreationInput;
    type UpdateInput = RecipeUpdateInput;

    const RESOURCE: &'static str = "recipes";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &RecipeUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Name", &mut self.name, &input.name)
            .set("Source", &mut self.source, &input.source)
            .set("Description", &mut self.description, &input.description)
            .set("InspiredByRecipeID", &mut self.inspired_by_recipe_id, &input.inspired_by_recipe_id);
        tracker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inspiration_keeps_its_wire_name() {
        let input = RecipeUpdateInput {
            name: "bread".into(),
            source: String::new(),
            description: String::new(),
            inspired_by_recipe_id: Some(3),
        };
        let encoded = serde_json::to_value(&input).unwrap();
        assert_eq!(encoded["inspiredByRecipeID"], json!(3));
    }

    #[test]
    fn creation_needs_an_account() {
        let input = RecipeCreationInput {
            name: "bread".into(),
            source: String::new(),
            description: String::new(),
            inspired_by_recipe_id: None,
            belongs_to_account: 0,
        };
        assert_eq!(input.validate().unwrap_err().field, "belongsToAccount");
    }
}
