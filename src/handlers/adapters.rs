//! Per-entity wiring for the shared handlers: names, form fields and owners.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::Instrument;

use super::entity::{routes as entity_routes, table_view, EntityAdapter, SEARCH_QUERY_KEY};
use super::{Composition, Fragment, FullPage, Render, Service};
use crate::datastore::{DataStore, EntitySearcher};
use crate::error::FrontendResult;
use crate::forms::{FormField, FormValues};
use crate::observability::{request_span, Acknowledge};
use crate::types::*;

/// Webhook events arrive as one comma separated field or as repeated fields.
fn list_field(form: &FormValues, key: &str) -> Vec<String> {
    form.get_all(key)
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Blank optional text fields mean "unset".
fn optional_text(form: &FormValues, key: &str) -> Option<String> {
    form.optional::<String>(key).filter(|v| !v.trim().is_empty())
}

/// Same for numbers: a blank field is `None`, not zero.
fn optional_number<T: FormField>(form: &FormValues, key: &str) -> Option<T> {
    optional_text(form, key).and(form.optional::<T>(key))
}

impl EntityAdapter for Account {
    const SINGULAR: &'static str = "Account";
    const PLURAL: &'static str = "Accounts";
    const TEMPLATE_NAME: &'static str = "account";

    fn creation_input(form: &FormValues) -> AccountCreationInput {
        AccountCreationInput {
            name: form.value("name"),
            contact_email: form.value("contactEmail"),
            contact_phone: form.value("contactPhone"),
        }
    }

    fn update_input(form: &FormValues) -> AccountUpdateInput {
        AccountUpdateInput {
            name: form.value("name"),
            contact_email: form.value("contactEmail"),
            contact_phone: form.value("contactPhone"),
        }
    }
}

impl EntityAdapter for ApiClient {
    const SINGULAR: &'static str = "API Client";
    const PLURAL: &'static str = "API Clients";
    const TEMPLATE_NAME: &'static str = "api_client";

    fn creation_input(form: &FormValues) -> ApiClientCreationInput {
        ApiClientCreationInput { name: form.value("name") }
    }

    fn update_input(form: &FormValues) -> ApiClientUpdateInput {
        ApiClientUpdateInput { name: form.value("name") }
    }
}

impl EntityAdapter for User {
    const SINGULAR: &'static str = "User";
    const PLURAL: &'static str = "Users";
    const TEMPLATE_NAME: &'static str = "user";

    fn creation_input(form: &FormValues) -> UserCreationInput {
        UserCreationInput {
            username: form.value("username"),
            password: form.value("password"),
        }
    }

    fn update_input(form: &FormValues) -> UserUpdateInput {
        UserUpdateInput {
            username: form.value("username"),
            avatar_src: optional_text(form, "avatarSrc"),
        }
    }

    fn table_searcher(store: &DataStore) -> Option<Arc<dyn EntitySearcher<Self>>> {
        Some(Arc::clone(&store.user_search))
    }
}

impl EntityAdapter for Webhook {
    const SINGULAR: &'static str = "Webhook";
    const PLURAL: &'static str = "Webhooks";
    const TEMPLATE_NAME: &'static str = "webhook";

    fn creation_input(form: &FormValues) -> WebhookCreationInput {
        WebhookCreationInput {
            name: form.value("name"),
            content_type: form.value("contentType"),
            url: form.value("url"),
            method: form.value("method"),
            events: list_field(form, "events"),
            belongs_to_account: 0,
        }
    }

    fn update_input(form: &FormValues) -> WebhookUpdateInput {
        WebhookUpdateInput {
            name: form.value("name"),
            content_type: form.value("contentType"),
            url: form.value("url"),
            method: form.value("method"),
            events: list_field(form, "events"),
        }
    }

    fn assign_owner(input: &mut WebhookCreationInput, owner: &AccountOwned) {
        input.belongs_to_account = owner.account_id;
    }
}

impl EntityAdapter for Invitation {
    const SINGULAR: &'static str = "Invitation";
    const PLURAL: &'static str = "Invitations";
    const TEMPLATE_NAME: &'static str = "invitation";

    fn creation_input(form: &FormValues) -> InvitationCreationInput {
        InvitationCreationInput {
            code: form.value("code"),
            consumed: form.value("consumed"),
            belongs_to_account: 0,
        }
    }

    fn update_input(form: &FormValues) -> InvitationUpdateInput {
        InvitationUpdateInput {
            code: form.value("code"),
            consumed: form.value("consumed"),
        }
    }

    fn assign_owner(input: &mut InvitationCreationInput, owner: &AccountOwned) {
        input.belongs_to_account = owner.account_id;
    }
}

impl EntityAdapter for Report {
    const SINGULAR: &'static str = "Report";
    const PLURAL: &'static str = "Reports";
    const TEMPLATE_NAME: &'static str = "report";

    fn creation_input(form: &FormValues) -> ReportCreationInput {
        ReportCreationInput {
            report_type: form.value("reportType"),
            concern: form.value("concern"),
            belongs_to_account: 0,
        }
    }

    fn update_input(form: &FormValues) -> ReportUpdateInput {
        ReportUpdateInput {
            report_type: form.value("reportType"),
            concern: form.value("concern"),
        }
    }

    fn assign_owner(input: &mut ReportCreationInput, owner: &AccountOwned) {
        input.belongs_to_account = owner.account_id;
    }
}

fn valid_ingredient_fields(form: &FormValues) -> ValidIngredientFields {
    ValidIngredientFields {
        name: form.value("name"),
        variant: form.value("variant"),
        description: form.value("description"),
        warning: form.value("warning"),
        contains_egg: form.value("containsEgg"),
        contains_dairy: form.value("containsDairy"),
        contains_peanut: form.value("containsPeanut"),
        contains_tree_nut: form.value("containsTreeNut"),
        contains_soy: form.value("containsSoy"),
        contains_wheat: form.value("containsWheat"),
        contains_shellfish: form.value("containsShellfish"),
        contains_sesame: form.value("containsSesame"),
        contains_fish: form.value("containsFish"),
        contains_gluten: form.value("containsGluten"),
        animal_flesh: form.value("animalFlesh"),
        animal_derived: form.value("animalDerived"),
        volumetric: form.value("volumetric"),
        icon_path: form.value("iconPath"),
    }
}

impl EntityAdapter for ValidIngredient {
    const SINGULAR: &'static str = "Valid Ingredient";
    const PLURAL: &'static str = "Valid Ingredients";
    const TEMPLATE_NAME: &'static str = "valid_ingredient";

    fn creation_input(form: &FormValues) -> ValidIngredientFields {
        valid_ingredient_fields(form)
    }

    fn update_input(form: &FormValues) -> ValidIngredientFields {
        valid_ingredient_fields(form)
    }
}

fn valid_instrument_fields(form: &FormValues) -> ValidInstrumentFields {
    ValidInstrumentFields {
        name: form.value("name"),
        variant: form.value("variant"),
        description: form.value("description"),
        icon_path: form.value("iconPath"),
    }
}

impl EntityAdapter for ValidInstrument {
    const SINGULAR: &'static str = "Valid Instrument";
    const PLURAL: &'static str = "Valid Instruments";
    const TEMPLATE_NAME: &'static str = "valid_instrument";

    fn creation_input(form: &FormValues) -> ValidInstrumentFields {
        valid_instrument_fields(form)
    }

    fn update_input(form: &FormValues) -> ValidInstrumentFields {
        valid_instrument_fields(form)
    }
}

fn valid_preparation_fields(form: &FormValues) -> ValidPreparationFields {
    ValidPreparationFields {
        name: form.value("name"),
        description: form.value("description"),
        icon_path: form.value("iconPath"),
    }
}

impl EntityAdapter for ValidPreparation {
    const SINGULAR: &'static str = "Valid Preparation";
    const PLURAL: &'static str = "Valid Preparations";
    const TEMPLATE_NAME: &'static str = "valid_preparation";

    fn creation_input(form: &FormValues) -> ValidPreparationFields {
        valid_preparation_fields(form)
    }

    fn update_input(form: &FormValues) -> ValidPreparationFields {
        valid_preparation_fields(form)
    }
}

fn valid_preparation_instrument_fields(form: &FormValues) -> ValidPreparationInstrumentFields {
    ValidPreparationInstrumentFields {
        instrument_id: form.value("instrumentID"),
        preparation_id: form.value("preparationID"),
        notes: form.value("notes"),
    }
}

impl EntityAdapter for ValidPreparationInstrument {
    const SINGULAR: &'static str = "Valid Preparation Instrument";
    const PLURAL: &'static str = "Valid Preparation Instruments";
    const TEMPLATE_NAME: &'static str = "valid_preparation_instrument";

    fn creation_input(form: &FormValues) -> ValidPreparationInstrumentFields {
        valid_preparation_instrument_fields(form)
    }

    fn update_input(form: &FormValues) -> ValidPreparationInstrumentFields {
        valid_preparation_instrument_fields(form)
    }
}

fn valid_ingredient_preparation_fields(form: &FormValues) -> ValidIngredientPreparationFields {
    ValidIngredientPreparationFields {
        notes: form.value("notes"),
        valid_ingredient_id: form.value("validIngredientID"),
        valid_preparation_id: form.value("validPreparationID"),
    }
}

impl EntityAdapter for ValidIngredientPreparation {
    const SINGULAR: &'static str = "Valid Ingredient Preparation";
    const PLURAL: &'static str = "Valid Ingredient Preparations";
    const TEMPLATE_NAME: &'static str = "valid_ingredient_preparation";

    fn creation_input(form: &FormValues) -> ValidIngredientPreparationFields {
        valid_ingredient_preparation_fields(form)
    }

    fn update_input(form: &FormValues) -> ValidIngredientPreparationFields {
        valid_ingredient_preparation_fields(form)
    }
}

impl EntityAdapter for Recipe {
    const SINGULAR: &'static str = "Recipe";
    const PLURAL: &'static str = "Recipes";
    const TEMPLATE_NAME: &'static str = "recipe";
    const ID_PARAM: &'static str = ownership::RECIPE_ID_PARAM;

    fn creation_input(form: &FormValues) -> RecipeCreationInput {
        RecipeCreationInput {
            name: form.value("name"),
            source: form.value("source"),
            description: form.value("description"),
            inspired_by_recipe_id: form.optional::<u64>("inspiredByRecipeID").filter(|id| *id != 0),
            belongs_to_account: 0,
        }
    }

    fn update_input(form: &FormValues) -> RecipeUpdateInput {
        RecipeUpdateInput {
            name: form.value("name"),
            source: form.value("source"),
            description: form.value("description"),
            inspired_by_recipe_id: form.optional::<u64>("inspiredByRecipeID").filter(|id| *id != 0),
        }
    }

    fn assign_owner(input: &mut RecipeCreationInput, owner: &AccountOwned) {
        input.belongs_to_account = owner.account_id;
    }

    fn title(recipe: &Recipe) -> String {
        recipe.name.clone()
    }
}

impl EntityAdapter for RecipeStep {
    const SINGULAR: &'static str = "Recipe Step";
    const PLURAL: &'static str = "Recipe Steps";
    const TEMPLATE_NAME: &'static str = "recipe_step";
    const ID_PARAM: &'static str = ownership::RECIPE_STEP_ID_PARAM;

    fn creation_input(form: &FormValues) -> RecipeStepCreationInput {
        RecipeStepCreationInput {
            index: form.value("index"),
            preparation_id: form.value("preparationID"),
            prerequisite_step: form.value("prerequisiteStep"),
            min_estimated_time_in_seconds: form.value("minEstimatedTimeInSeconds"),
            max_estimated_time_in_seconds: form.value("maxEstimatedTimeInSeconds"),
            temperature_in_celsius: optional_number(form, "temperatureInCelsius"),
            notes: form.value("notes"),
            why: form.value("why"),
            belongs_to_recipe: 0,
        }
    }

    fn update_input(form: &FormValues) -> RecipeStepUpdateInput {
        RecipeStepUpdateInput {
            index: form.value("index"),
            preparation_id: form.value("preparationID"),
            prerequisite_step: form.value("prerequisiteStep"),
            min_estimated_time_in_seconds: form.value("minEstimatedTimeInSeconds"),
            max_estimated_time_in_seconds: form.value("maxEstimatedTimeInSeconds"),
            temperature_in_celsius: optional_number(form, "temperatureInCelsius"),
            notes: form.value("notes"),
            why: form.value("why"),
        }
    }

    fn assign_owner(input: &mut RecipeStepCreationInput, owner: &RecipeOwned) {
        input.belongs_to_recipe = owner.recipe_id;
    }
}

impl EntityAdapter for RecipeStepIngredient {
    const SINGULAR: &'static str = "Recipe Step Ingredient";
    const PLURAL: &'static str = "Recipe Step Ingredients";
    const TEMPLATE_NAME: &'static str = "recipe_step_ingredient";

    fn creation_input(form: &FormValues) -> RecipeStepIngredientCreationInput {
        RecipeStepIngredientCreationInput {
            ingredient_id: form.optional::<u64>("ingredientID").filter(|id| *id != 0),
            name: form.value("name"),
            quantity_type: form.value("quantityType"),
            quantity_value: form.value("quantityValue"),
            quantity_notes: form.value("quantityNotes"),
            product_of_recipe_step: form.value("productOfRecipeStep"),
            ingredient_notes: form.value("ingredientNotes"),
            belongs_to_recipe_step: 0,
        }
    }

    fn update_input(form: &FormValues) -> RecipeStepIngredientUpdateInput {
        RecipeStepIngredientUpdateInput {
            ingredient_id: form.optional::<u64>("ingredientID").filter(|id| *id != 0),
            name: form.value("name"),
            quantity_type: form.value("quantityType"),
            quantity_value: form.value("quantityValue"),
            quantity_notes: form.value("quantityNotes"),
            product_of_recipe_step: form.value("productOfRecipeStep"),
            ingredient_notes: form.value("ingredientNotes"),
        }
    }

    fn assign_owner(input: &mut RecipeStepIngredientCreationInput, owner: &RecipeStepOwned) {
        input.belongs_to_recipe_step = owner.recipe_step_id;
    }
}

impl EntityAdapter for RecipeStepProduct {
    const SINGULAR: &'static str = "Recipe Step Product";
    const PLURAL: &'static str = "Recipe Step Products";
    const TEMPLATE_NAME: &'static str = "recipe_step_product";

    fn creation_input(form: &FormValues) -> RecipeStepProductCreationInput {
        RecipeStepProductCreationInput {
            name: form.value("name"),
            quantity_type: form.value("quantityType"),
            quantity_value: form.value("quantityValue"),
            quantity_notes: form.value("quantityNotes"),
            belongs_to_recipe_step: 0,
        }
    }

    fn update_input(form: &FormValues) -> RecipeStepProductUpdateInput {
        RecipeStepProductUpdateInput {
            name: form.value("name"),
            quantity_type: form.value("quantityType"),
            quantity_value: form.value("quantityValue"),
            quantity_notes: form.value("quantityNotes"),
        }
    }

    fn assign_owner(input: &mut RecipeStepProductCreationInput, owner: &RecipeStepOwned) {
        input.belongs_to_recipe_step = owner.recipe_step_id;
    }
}

pub const VALID_PREPARATIONS_SEARCH_PARTIAL: &str = "search/valid_preparations_search";

/// GET /elements/valid_preparations/search - suggestion list for a search box
pub async fn valid_preparation_suggestions(State(service): State<Arc<Service>>, request: Request) -> Response {
    let span = request_span(ValidPreparation::RESOURCE, "search", request.method(), request.uri());
    render_valid_preparation_suggestions(&service, request)
        .instrument(span)
        .await
        .into_response()
}

async fn render_valid_preparation_suggestions(service: &Service, request: Request) -> FrontendResult<Response> {
    let (parts, _) = request.into_parts();
    let session = service.require_session(&parts, None)?;

    let query = FormValues::parse(parts.uri.query().unwrap_or("").as_bytes())
        .get(SEARCH_QUERY_KEY)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let suggestions = if query.is_empty() {
        Vec::new()
    } else {
        service
            .data_store
            .valid_preparation_search
            .search(&query)
            .await
            .acknowledged("searching valid preparations")?
    };

    Fragment::compose(
        service,
        Render {
            partial: VALID_PREPARATIONS_SEARCH_PARTIAL,
            helpers: service.base_helpers(service.language(&parts.headers)),
            title: ValidPreparation::PLURAL.to_string(),
            session: Some(&session),
            payload: suggestions,
        },
    )
}

pub fn routes() -> Router<Arc<Service>> {
    Router::new()
        .merge(entity_routes::<Account>())
        .merge(entity_routes::<ApiClient>())
        .merge(entity_routes::<User>())
        .merge(entity_routes::<Webhook>())
        .merge(entity_routes::<Invitation>())
        .merge(entity_routes::<Report>())
        .merge(entity_routes::<ValidIngredient>())
        .merge(entity_routes::<ValidInstrument>())
        .merge(entity_routes::<ValidPreparation>())
        .merge(entity_routes::<ValidPreparationInstrument>())
        .merge(entity_routes::<ValidIngredientPreparation>())
        .merge(entity_routes::<Recipe>())
        .merge(entity_routes::<RecipeStep>())
        .merge(entity_routes::<RecipeStepIngredient>())
        .merge(entity_routes::<RecipeStepProduct>())
        // user search for admins, same table in search mode
        .route("/admin/users/search", get(table_view::<User, FullPage>))
        .route("/dashboard_pages/admin/users/search", get(table_view::<User, Fragment>))
        .route("/elements/valid_preparations/search", get(valid_preparation_suggestions))
}
