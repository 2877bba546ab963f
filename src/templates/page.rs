use serde::Serialize;

use crate::types::SessionContextData;

/// Everything the base layout needs to frame a page's content.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T: Serialize> {
    pub title: String,
    pub page_description: String,
    pub page_image_preview: String,
    pub page_image_preview_description: String,
    pub is_logged_in: bool,
    pub is_service_admin: bool,
    pub content_data: T,
}

impl<T: Serialize> PageData<T> {
    pub fn new(title: impl Into<String>, session: Option<&SessionContextData>, content_data: T) -> Self {
        Self {
            title: title.into(),
            page_description: String::new(),
            page_image_preview: String::new(),
            page_image_preview_description: String::new(),
            is_logged_in: session.is_some(),
            is_service_admin: session.is_some_and(SessionContextData::is_service_admin),
            content_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_with_roles;
    use crate::types::session::{SERVICE_ADMIN_ROLE, SERVICE_USER_ROLE};

    #[test]
    fn admin_flag_follows_service_role() {
        let admin = session_with_roles(&[SERVICE_ADMIN_ROLE]);
        let user = session_with_roles(&[SERVICE_USER_ROLE]);

        assert!(PageData::new("t", Some(&admin), ()).is_service_admin);
        assert!(!PageData::new("t", Some(&user), ()).is_service_admin);

        let anonymous = PageData::new("t", None, ());
        assert!(!anonymous.is_logged_in);
        assert!(!anonymous.is_service_admin);
    }

    #[test]
    fn serializes_with_layout_field_names() {
        let mut page = PageData::new("Account #42", None, serde_json::json!({"id": 42}));
        page.page_description = "an account".to_string();
        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value["title"], "Account #42");
        assert_eq!(value["pageDescription"], "an account");
        assert_eq!(value["isLoggedIn"], false);
        assert_eq!(value["contentData"]["id"], 42);
    }
}
