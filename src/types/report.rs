use serde::{Deserialize, Serialize};

use super::{require_id, require_non_empty, AccountOwned, ChangeTracker, Entity, FieldChangeSummary, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: u64,
    pub report_type: String,
    pub concern: String,
    pub created_on: u64,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreationInput {
    pub report_type: String,
    pub concern: String,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportUpdateInput {
    pub report_type: String,
    pub concern: String,
}

impl Validate for ReportCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("reportType", &self.report_type)?;
        require_non_empty("concern", &self.concern)?;
        require_id("belongsToAccount", self.belongs_to_account)
    }
}

impl Validate for ReportUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("reportType", &self.report_type)?;
        require_non_empty("concern", &self.concern)
    }
}

impl Entity for Report {
    type Owner = AccountOwned;
    type CreationInput = ReportCreationInput;
    type UpdateInput = ReportUpdateInput;

    const RESOURCE: &'static str = "reports";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &ReportUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("ReportType", &mut self.report_type, &input.report_type)
            .set("Concern", &mut self.concern, &input.concern);
        tracker.finish()
    }
}
