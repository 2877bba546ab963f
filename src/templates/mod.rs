//! Compiled page templates.
//!
//! Every partial is compiled twice at startup: once installed as the base
//! layout's `content` block (full pages) and once on its own (fragments for
//! in-page swaps). Requests only pick a compiled set and bind helpers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::observability::acknowledge;

pub mod engine;
pub mod helpers;
pub mod page;

pub use engine::{ExecError, ParseError, TemplateSet, Value};
pub use helpers::{format_time, render_price, FuncMap, Helper, PRICE_CEILING};
pub use page::PageData;

pub const BASE_TEMPLATE_NAME: &str = "base";
pub const CONTENT_BLOCK: &str = "content";

const BASE_TEMPLATE: &str = include_str!("base_template.gotpl");

macro_rules! embedded_partials {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("partials/", $name, ".gotpl")))),*]
    };
}

/// Partials compiled into the binary, keyed by path under `partials/`.
pub const PARTIALS: &[(&str, &str)] = embedded_partials![
    "creators/account_creator",
    "creators/api_client_creator",
    "creators/user_creator",
    "creators/webhook_creator",
    "creators/invitation_creator",
    "creators/report_creator",
    "creators/valid_ingredient_creator",
    "creators/valid_instrument_creator",
    "creators/valid_preparation_creator",
    "creators/valid_preparation_instrument_creator",
    "creators/valid_ingredient_preparation_creator",
    "creators/recipe_creator",
    "creators/recipe_step_creator",
    "creators/recipe_step_ingredient_creator",
    "creators/recipe_step_product_creator",
    "editors/account_editor",
    "editors/api_client_editor",
    "editors/user_editor",
    "editors/webhook_editor",
    "editors/invitation_editor",
    "editors/report_editor",
    "editors/valid_ingredient_editor",
    "editors/valid_instrument_editor",
    "editors/valid_preparation_editor",
    "editors/valid_preparation_instrument_editor",
    "editors/valid_ingredient_preparation_editor",
    "editors/recipe_editor",
    "editors/recipe_step_editor",
    "editors/recipe_step_ingredient_editor",
    "editors/recipe_step_product_editor",
    "tables/accounts_table",
    "tables/api_clients_table",
    "tables/users_table",
    "tables/webhooks_table",
    "tables/invitations_table",
    "tables/reports_table",
    "tables/valid_ingredients_table",
    "tables/valid_instruments_table",
    "tables/valid_preparations_table",
    "tables/valid_preparation_instruments_table",
    "tables/valid_ingredient_preparations_table",
    "tables/recipes_table",
    "tables/recipe_steps_table",
    "tables/recipe_step_ingredients_table",
    "tables/recipe_step_products_table",
    "settings/user_settings",
    "settings/account_settings",
    "settings/admin_settings",
    "search/valid_preparations_search",
    "auth/login_prompt",
    "auth/registration_prompt",
    "home/homepage",
    "billing/checkout_result",
];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Execute(#[from] ExecError),
    #[error("no template registered as {0:?}")]
    UnknownPartial(String),
    #[error("encoding template data: {0}")]
    Data(#[from] serde_json::Error),
}

/// The source wrapper that turns a partial into the base layout's content.
pub fn wrap_in_content_block(partial: &str) -> String {
    format!("{{{{ define \"{}\" }}}}\n\t{}\n{{{{ end }}}}\n", CONTENT_BLOCK, partial)
}

/// A compiled template plus the helpers one render binds into scope.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    set: Arc<TemplateSet>,
    entry: String,
    helpers: FuncMap,
}

impl CompiledTemplate {
    pub fn execute<T: Serialize + ?Sized>(&self, data: &T) -> Result<String, TemplateError> {
        let value = Value::from_serialize(data)?;
        Ok(self.set.execute(&self.entry, &value, &self.helpers)?)
    }
}

/// Base layout and partials, compiled once and shared read-only.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    full_pages: HashMap<&'static str, Arc<TemplateSet>>,
    fragments: HashMap<&'static str, Arc<TemplateSet>>,
}

impl TemplateRegistry {
    /// Compiles the embedded layout and partials.
    pub fn new() -> Result<Self, TemplateError> {
        Self::compile(BASE_TEMPLATE, PARTIALS)
    }

    pub fn compile(base_source: &str, partials: &[(&'static str, &'static str)]) -> Result<Self, TemplateError> {
        let base = TemplateSet::parse(BASE_TEMPLATE_NAME, base_source)?;

        let mut registry = Self::default();
        for &(name, source) in partials {
            let mut full = base.clone();
            full.add(name, &wrap_in_content_block(source))?;
            registry.full_pages.insert(name, Arc::new(full));
            registry.fragments.insert(name, Arc::new(TemplateSet::parse(name, source)?));
        }

        tracing::debug!(partials = partials.len(), "compiled templates");
        Ok(registry)
    }

    pub fn contains(&self, partial: &str) -> bool {
        self.fragments.contains_key(partial)
    }

    /// The partial installed as the base layout's content; executed with a
    /// [`PageData`] envelope.
    pub fn render_template_into_base_template(
        &self,
        partial: &str,
        helpers: FuncMap,
    ) -> Result<CompiledTemplate, TemplateError> {
        let set = self
            .full_pages
            .get(partial)
            .ok_or_else(|| TemplateError::UnknownPartial(partial.to_string()))?;

        Ok(CompiledTemplate {
            set: Arc::clone(set),
            entry: BASE_TEMPLATE_NAME.to_string(),
            helpers,
        })
    }

    /// The partial alone; executed directly against its payload.
    pub fn parse_template(&self, partial: &str, helpers: FuncMap) -> Result<CompiledTemplate, TemplateError> {
        let set = self
            .fragments
            .get(partial)
            .ok_or_else(|| TemplateError::UnknownPartial(partial.to_string()))?;

        Ok(CompiledTemplate {
            set: Arc::clone(set),
            entry: partial.to_string(),
            helpers,
        })
    }
}

/// Executes `template` into a `text/html; charset=utf-8` response. Output is
/// buffered, so a failed execution still turns into a clean 500.
pub fn render_template_to_response<T: Serialize + ?Sized>(template: &CompiledTemplate, data: &T) -> Response {
    match template.execute(data) {
        Ok(body) => Html(body).into_response(),
        Err(err) => {
            acknowledge(&err, "rendering template");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::CONTENT_TYPE;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const BASE: &str = r#"<title>{{ .title }}</title>{{ if .isServiceAdmin }}[admin]{{ end }}<main>{{ template "content" .contentData }}</main>"#;
    const PARTIAL: &str = r#"<h1>{{ componentTitle . }}</h1>"#;

    fn registry() -> TemplateRegistry {
        TemplateRegistry::compile(BASE, &[("editors/thing_editor", PARTIAL)]).unwrap()
    }

    fn helpers() -> FuncMap {
        #[derive(serde::Deserialize)]
        struct Thing {
            id: u64,
        }
        FuncMap::new().with("componentTitle", Helper::caption(|t: &Thing| format!("Thing #{}", t.id)))
    }

    #[test]
    fn content_wrapper_is_exact() {
        assert_eq!(
            wrap_in_content_block("<p>hi</p>"),
            "{{ define \"content\" }}\n\t<p>hi</p>\n{{ end }}\n"
        );
    }

    #[test]
    fn full_page_includes_the_layout() {
        let tmpl = registry()
            .render_template_into_base_template("editors/thing_editor", helpers())
            .unwrap();
        let page = PageData::new("Thing #3", None, json!({"id": 3}));

        assert_eq!(
            tmpl.execute(&page).unwrap(),
            "<title>Thing #3</title><main>\n\t<h1>Thing #3</h1>\n</main>"
        );
    }

    #[test]
    fn fragment_is_just_the_partial() {
        let tmpl = registry().parse_template("editors/thing_editor", helpers()).unwrap();
        assert_eq!(tmpl.execute(&json!({"id": 3})).unwrap(), "<h1>Thing #3</h1>");
    }

    #[test]
    fn unknown_partials_are_errors() {
        assert!(matches!(
            registry().parse_template("editors/nothing", FuncMap::new()),
            Err(TemplateError::UnknownPartial(_))
        ));
    }

    #[test]
    fn broken_sources_fail_compilation() {
        assert!(TemplateRegistry::compile(BASE, &[("bad", "{{ if .x }}")]).is_err());
        assert!(TemplateRegistry::compile("{{ end }}", &[]).is_err());
    }

    #[test]
    fn embedded_templates_compile() {
        let registry = TemplateRegistry::new().unwrap();
        for (name, _) in PARTIALS {
            assert!(registry.contains(name), "{} missing", name);
        }
    }

    #[tokio::test]
    async fn responses_are_html() {
        let tmpl = registry().parse_template("editors/thing_editor", helpers()).unwrap();
        let response = render_template_to_response(&tmpl, &json!({"id": 1}));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn execution_failures_become_500() {
        let tmpl = registry().parse_template("editors/thing_editor", FuncMap::new()).unwrap();
        let response = render_template_to_response(&tmpl, &json!({"id": 1}));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
