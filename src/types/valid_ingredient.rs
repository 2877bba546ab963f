use serde::{Deserialize, Serialize};

use super::{require_non_empty, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidIngredient {
    pub id: u64,
    pub name: String,
    pub variant: String,
    pub description: String,
    pub warning: String,
    pub contains_egg: bool,
    pub contains_dairy: bool,
    pub contains_peanut: bool,
    pub contains_tree_nut: bool,
    pub contains_soy: bool,
    pub contains_wheat: bool,
    pub contains_shellfish: bool,
    pub contains_sesame: bool,
    pub contains_fish: bool,
    pub contains_gluten: bool,
    pub animal_flesh: bool,
    pub animal_derived: bool,
    pub volumetric: bool,
    pub icon_path: String,
}

/// The editable fields; creation and update take the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ValidIngredientFields {
    pub name: String,
    pub variant: String,
    pub description: String,
    pub warning: String,
    pub contains_egg: bool,
    pub contains_dairy: bool,
    pub contains_peanut: bool,
    pub contains_tree_nut: bool,
    pub contains_soy: bool,
    pub contains_wheat: bool,
    pub contains_shellfish: bool,
    pub contains_sesame: bool,
    pub contains_fish: bool,
    pub contains_gluten: bool,
    pub animal_flesh: bool,
    pub animal_derived: bool,
    pub volumetric: bool,
    pub icon_path: String,
}

pub type ValidIngredientCreationInput = ValidIngredientFields;
pub type ValidIngredientUpdateInput = ValidIngredientFields;

impl Validate for ValidIngredientFields {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Entity for ValidIngredient {
    type Owner = Unowned;
    type CreationInput = ValidIngredientCreationInput;
    type UpdateInput = ValidIngredientUpdateInput;

    const RESOURCE: &'static str = "valid_ingredients";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &ValidIngredientUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Name", &mut self.name, &input.name)
            .set("Variant", &mut self.variant, &input.variant)
            .set("Description", &mut self.description, &input.description)
            .set("Warning", &mut self.warning, &input.warning)
            .set("ContainsEgg", &mut self.contains_egg, &input.contains_egg)
            .set("ContainsDairy", &mut self.contains_dairy, &input.contains_dairy)
            .set("ContainsPeanut", &mut self.contains_peanut, &input.contains_peanut)
            .set("ContainsTreeNut", &mut self.contains_tree_nut, &input.contains_tree_nut)
            .set("ContainsSoy", &mut self.contains_soy, &input.contains_soy)
            .set("ContainsWheat", &mut self.contains_wheat, &input.contains_wheat)
            .set("ContainsShellfish", &mut self.contains_shellfish, &input.contains_shellfish)
            .set("ContainsSesame", &mut self.contains_sesame, &input.contains_sesame)
            .set("ContainsFish", &mut self.contains_fish, &input.contains_fish)
            .set("ContainsGluten", &mut self.contains_gluten, &input.contains_gluten)
            .set("AnimalFlesh", &mut self.animal_flesh, &input.animal_flesh)
            .set("AnimalDerived", &mut self.animal_derived, &input.animal_derived)
            .set("Volumetric", &mut self.volumetric, &input.volumetric)
            .set("IconPath", &mut self.icon_path, &input.icon_path);
        tracker.finish()
    }
}
