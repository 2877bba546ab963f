use serde::{Deserialize, Serialize};

use super::{require_non_empty, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidInstrument {
    pub id: u64,
    pub name: String,
    pub variant: String,
    pub description: String,
    pub icon_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidInstrumentFields {
    pub name: String,
    pub variant: String,
    pub description: String,
    pub icon_path: String,
}

pub type ValidInstrumentCreationInput = ValidInstrumentFields;
pub type ValidInstrumentUpdateInput = ValidInstrumentFields;

impl Validate for ValidInstrumentFields {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)
    }
}

impl Entity for ValidInstrument {
    type Owner = Unowned;
    type CreationInput = ValidInstrumentCreationInput;
    type UpdateInput = ValidInstrumentUpdateInput;

    const RESOURCE: &'static str = "valid_instruments";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &ValidInstrumentUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Name", &mut self.name, &input.name)
            .set("Variant", &mut self.variant, &input.variant)
            .set("Description", &mut self.description, &input.description)
            .set("IconPath", &mut self.icon_path, &input.icon_path);
        tracker.finish()
    }
}
