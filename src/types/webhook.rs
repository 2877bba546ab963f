use serde::{Deserialize, Serialize};

use super::{require_id, require_non_empty, AccountOwned, ChangeTracker, Entity, FieldChangeSummary, Validate, ValidationError};

const ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: u64,
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub events: Vec<String>,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookCreationInput {
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
    pub belongs_to_account: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookUpdateInput {
    pub name: String,
    pub content_type: String,
    pub url: String,
    pub method: String,
    pub events: Vec<String>,
}

fn validate_target(url: &str, method: &str) -> Result<(), ValidationError> {
    url::Url::parse(url).map_err(|e| ValidationError::new("url", e.to_string()))?;
    if !ALLOWED_METHODS.contains(&method) {
        return Err(ValidationError::new("method", format!("unsupported method {:?}", method)));
    }
    Ok(())
}

impl Validate for WebhookCreationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_target(&self.url, &self.method)?;
        require_id("belongsToAccount", self.belongs_to_account)
    }
}

impl Validate for WebhookUpdateInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        validate_target(&self.url, &self.method)
    }
}

impl Entity for Webhook {
    type Owner = AccountOwned;
    type CreationInput = WebhookCreationInput;
    type UpdateInput = WebhookUpdateInput;

    const RESOURCE: &'static str = "webhooks";

    fn id(&self) -> u64 {
        self.id
    }

    fn update(&mut self, input: &WebhookUpdateInput) -> Vec<FieldChangeSummary> {
        let mut tracker = ChangeTracker::new();
        tracker
            .set("Name", &mut self.name, &input.name)
            .set("ContentType", &mut self.content_type, &input.content_type)
            .set("URL", &mut self.url, &input.url)
            .set("Method", &mut self.method, &input.method)
            .set("Events", &mut self.events, &input.events);
        tracker.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_urls_and_methods() {
        let mut input = WebhookUpdateInput {
            name: "hook".into(),
            content_type: "application/json".into(),
            url: "not a url".into(),
            method: "POST".into(),
            events: vec![],
        };
        assert_eq!(input.validate().unwrap_err().field, "url");

        input.url = "https://example.com/hook".into();
        input.method = "TRACE".into();
        assert_eq!(input.validate().unwrap_err().field, "method");

        input.method = "POST".into();
        assert!(input.validate().is_ok());
    }
}
