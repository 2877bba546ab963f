//! Who an entity belongs to, and how that shows up in URLs.

use std::collections::HashMap;
use std::fmt::Debug;

use crate::error::FrontendError;
use crate::types::SessionContextData;

pub const RECIPE_ID_PARAM: &str = "recipe_id";
pub const RECIPE_STEP_ID_PARAM: &str = "recipe_step_id";

/// Ownership key an entity's routes are scoped under.
pub trait Ownership: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Router pattern placed in front of the entity's plural path.
    const ROUTE_PREFIX: &'static str;

    /// Reads the key from the session and the matched path parameters.
    fn resolve(session: &SessionContextData, params: &HashMap<String, String>) -> Result<Self, FrontendError>;

    /// Concrete prefix for links and backend paths, e.g. `/recipes/3/recipe_steps/5`.
    fn path_prefix(&self) -> String;
}

/// Global catalog entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unowned;

impl Ownership for Unowned {
    const ROUTE_PREFIX: &'static str = "";

    fn resolve(_: &SessionContextData, _: &HashMap<String, String>) -> Result<Self, FrontendError> {
        Ok(Unowned)
    }

    fn path_prefix(&self) -> String {
        String::new()
    }
}

/// Entities scoped to the session's active account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountOwned {
    pub account_id: u64,
}

impl Ownership for AccountOwned {
    const ROUTE_PREFIX: &'static str = "";

    fn resolve(session: &SessionContextData, _: &HashMap<String, String>) -> Result<Self, FrontendError> {
        Ok(AccountOwned {
            account_id: session.active_account_id,
        })
    }

    fn path_prefix(&self) -> String {
        String::new()
    }
}

/// Entities nested under a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeOwned {
    pub recipe_id: u64,
}

impl Ownership for RecipeOwned {
    const ROUTE_PREFIX: &'static str = "/recipes/:recipe_id";

    fn resolve(_: &SessionContextData, params: &HashMap<String, String>) -> Result<Self, FrontendError> {
        Ok(RecipeOwned {
            recipe_id: parse_id_param(params, RECIPE_ID_PARAM)?,
        })
    }

    fn path_prefix(&self) -> String {
        format!("/recipes/{}", self.recipe_id)
    }
}

/// Entities nested under a recipe step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeStepOwned {
    pub recipe_id: u64,
    pub recipe_step_id: u64,
}

impl Ownership for RecipeStepOwned {
    const ROUTE_PREFIX: &'static str = "/recipes/:recipe_id/recipe_steps/:recipe_step_id";

    fn resolve(_: &SessionContextData, params: &HashMap<String, String>) -> Result<Self, FrontendError> {
        Ok(RecipeStepOwned {
            recipe_id: parse_id_param(params, RECIPE_ID_PARAM)?,
            recipe_step_id: parse_id_param(params, RECIPE_STEP_ID_PARAM)?,
        })
    }

    fn path_prefix(&self) -> String {
        format!("/recipes/{}/recipe_steps/{}", self.recipe_id, self.recipe_step_id)
    }
}

/// Reads a numeric identifier out of the matched path parameters.
pub fn parse_id_param(params: &HashMap<String, String>, name: &str) -> Result<u64, FrontendError> {
    let raw = params
        .get(name)
        .ok_or_else(|| FrontendError::invalid_parameter(format!("missing {}", name)))?;

    raw.parse::<u64>()
        .map_err(|_| FrontendError::invalid_parameter(format!("{} is not a valid identifier: {:?}", name, raw)))
}
