use serde::{Deserialize, Serialize};

use super::{require_id, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidPreparationInstrument {
    pub id: u64,
    #[serde(rename = "instrumentID")]
    pub instrument_id: u64,
    #[serde(rename = "preparationID")]
    pub preparation_id: u64,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidPreparationInstrumentFields {
    #[serde(rename = "instrumentID")]
    pub instrument_id: u64,
    #[serde(rename = "preparationID")]
    pub preparation_id: u64,
    pub notes: String,
}

pub type ValidPreparationInstrumentCreationInput = ValidPreparationInstrumentFields;
pub type ValidPreparationInstrumentUpdateInput = ValidPreparationInstrumentFields;

impl Validate for ValidPreparationInstrumentFields {
    fn validate(&self) -> Result<(), ValidationError> {
        require_id("instrumentID", self.instrument_id)?;
        require_id("preparationID", self.preparation_id)
    }
}

impl Entity for ValidPreparationInstrument {
    type Owner = Unowned;
    type CreationInput = ValidPreparationInstrumentCreationInput;
    type UpdateInput = ValidPreparationInstrumentUpdateInput;

    const RESOURCE: &'static str = "valid_preparation_instruments";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &ValidPreparationInstrumentUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("InstrumentID", &mut self.instrument_id, &input.instrument_id)
            .set("PreparationID", &mut self.preparation_id, &input.preparation_id)
            .set("Notes", &mut self.notes, &input.notes);
        tracker.finish()
    }
}
