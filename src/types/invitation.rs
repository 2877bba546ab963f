use serde::{Deserialize, Serialize};

use super::{require_id, require_non_empty, AccountOwned, ChangeTracker, Entity, FieldChangeSummary, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: u64,
    pub code: String,
    pub consumed: bool,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationCreationInput {
    pub code: String,
    pub consumed: bool,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationUpdateInput {
    pub code: String,
    pub consumed: bool,
}

impl Validate for InvitationCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("code", &self.code)?;
        require_id("belongsToAccount", self.belongs_to_account)
    }
}

impl Validate for InvitationUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("code", &self.code)
    }
}

impl Entity for Invitation {
    type Owner = AccountOwned;
    type CreationInput = InvitationCreationInput;
    type UpdateInput = InvitationUpdateInput;

    const RESOURCE: &'static str = "invitations";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &InvitationUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Code", &mut self.code, &input.code)
            .set("Consumed", &mut self.consumed, &input.consumed);
        tracker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_reports_consumption() {
        let mut invitation = Invitation {
            id: 1,
            code: "ABC".into(),
            consumed: false,
            belongs_to_account: 2,
        };
        let changes = invitation.update(&InvitationUpdateInput {
            code: "ABC".into(),
            consumed: true,
        });

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "Consumed");
        assert!(invitation.consumed);
    }

    #[test]
    fn creation_requires_account_and_code() {
        let mut input = InvitationCreationInput {
            code: "ABC".into(),
            consumed: false,
            belongs_to_account: 0,
        };
        assert!(input.validate().is_err());
        input.belongs_to_account = 42;
        assert!(input.validate().is_ok());
        input.code = String::new();
        assert!(input.validate().is_err());
    }
}
