use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const SERVICE_ADMIN_ROLE: &str = "service_admin";
pub const SERVICE_USER_ROLE: &str = "service_user";
pub const ACCOUNT_ADMIN_ROLE: &str = "account_admin";
pub const ACCOUNT_MEMBER_ROLE: &str = "account_member";

/// Who is calling and on behalf of which account. Read-only within a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContextData {
    pub requester: RequesterInfo,
    pub active_account_id: u64,
    #[serde(default)]
    pub account_permissions: HashMap<u64, AccountPermissions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterInfo {
    pub user_id: u64,
    #[serde(default)]
    pub reputation: String,
    #[serde(default)]
    pub reputation_explanation: String,
    pub service_permissions: ServicePermissions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePermissions {
    pub service_roles: Vec<String>,
}

impl ServicePermissions {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            service_roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.service_roles.iter().any(|r| r == role)
    }

    pub fn is_service_admin(&self) -> bool {
        self.has_role(SERVICE_ADMIN_ROLE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPermissions {
    pub account_roles: Vec<String>,
}

impl AccountPermissions {
    pub fn is_account_admin(&self) -> bool {
        self.account_roles.iter().any(|r| r == ACCOUNT_ADMIN_ROLE)
    }
}

impl SessionContextData {
    pub fn is_service_admin(&self) -> bool {
        self.requester.service_permissions.is_service_admin()
    }

    pub fn active_account_permissions(&self) -> Option<&AccountPermissions> {
        self.account_permissions.get(&self.active_account_id)
    }
}
