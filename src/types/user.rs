use serde::{Deserialize, Serialize};

use super::{require_non_empty, ChangeTracker, Entity, FieldChangeSummary, Unowned, Validate, ValidationError};

const MINIMUM_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub avatar_src: Option<String>,
    pub reputation: String,
    #[serde(default)]
    pub reputation_explanation: String,
    #[serde(default)]
    pub service_roles: Vec<String>,
    pub created_on: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreationInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateInput {
    pub username: String,
    pub avatar_src: Option<String>,
}

impl Validate for UserCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("username", &self.username)?;
        if self.password.chars().count() < MINIMUM_PASSWORD_LENGTH {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {} characters", MINIMUM_PASSWORD_LENGTH),
            ));
        }
        Ok(())
    }
}

impl Validate for UserUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("username", &self.username)
    }
}

impl Entity for User {
    type Owner = Unowned;
    type CreationInput = UserCreationInput;
    type UpdateInput = UserUpdateInput;

    const RESOURCE: &'static str = "users";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &UserUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Username", &mut self.username, &input.username)
            .set("AvatarSrc", &mut self.avatar_src, &input.avatar_src);
        tracker.finish()
    }
}
