//! Generated stand-ins for data store reads, used in fake-data mode.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{DataStoreError, EntityDataManager, EntitySearcher};
use crate::filter::QueryFilter;
use crate::types::{
    Account, ApiClient, Entity, FieldChangeSummary, Invitation, Pagination, QueryResult, Recipe, RecipeStep,
    RecipeStepIngredient, RecipeStepProduct, Report, User, ValidIngredient, ValidIngredientPreparation,
    ValidInstrument, ValidPreparation, ValidPreparationInstrument, Webhook,
};

const WORDS: &[&str] = &[
    "saffron", "braise", "julienne", "umami", "brioche", "chutney", "fennel", "miso", "paprika", "risotto",
    "sorrel", "tahini", "harissa", "gremolata", "sumac", "mirepoix", "shallot", "tamarind", "polenta", "quince",
];
const QUANTITY_TYPES: &[&str] = &["grams", "cups", "tablespoons", "teaspoons", "pieces", "milliliters"];
const REPORT_TYPES: &[&str] = &["usage", "abuse", "bug"];
const WEBHOOK_EVENTS: &[&str] = &["created", "updated", "archived"];
const BILLING_STATUSES: &[&str] = &["active", "unpaid", "cancelled", "trial"];

/// Random-but-plausible instances of an entity.
pub trait Fake: Entity {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

fn word<R: Rng + ?Sized>(rng: &mut R) -> String {
    WORDS.choose(rng).copied().unwrap_or("thing").to_string()
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&str]) -> String {
    options.choose(rng).copied().unwrap_or_default().to_string()
}

fn sentence<R: Rng + ?Sized>(rng: &mut R, words: usize) -> String {
    (0..words).map(|_| word(rng)).collect::<Vec<_>>().join(" ")
}

fn id<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen_range(1..=10_000)
}

fn timestamp<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    // 2020-01-01 through 2024-01-01
    rng.gen_range(1_577_836_800..=1_704_067_200)
}

fn quantity<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    (rng.gen_range(1..=400) as f32) / 4.0
}

impl Fake for Account {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name = word(rng);
        Account {
            id: id(rng),
            contact_email: format!("{}@example.com", name),
            contact_phone: format!("555-{:04}", rng.gen_range(0..10_000)),
            name,
            billing_status: pick(rng, BILLING_STATUSES),
            subscription_plan_id: rng.gen_bool(0.5).then(|| id(rng)),
            created_on: timestamp(rng),
            belongs_to_user: id(rng),
        }
    }
}

impl Fake for ApiClient {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ApiClient {
            id: id(rng),
            name: word(rng),
            client_id: format!("{:016x}", rng.gen::<u64>()),
            created_on: timestamp(rng),
            belongs_to_user: id(rng),
        }
    }
}

impl Fake for User {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        User {
            id: id(rng),
            username: format!("{}{}", word(rng), rng.gen_range(0..100)),
            avatar_src: None,
            reputation: "good".to_string(),
            reputation_explanation: String::new(),
            service_roles: vec!["service_user".to_string()],
            created_on: timestamp(rng),
        }
    }
}

impl Fake for Webhook {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let name = word(rng);
        Webhook {
            id: id(rng),
            url: format!("https://{}.example.com/hook", name),
            name,
            content_type: "application/json".to_string(),
            method: "POST".to_string(),
            events: vec![pick(rng, WEBHOOK_EVENTS)],
            belongs_to_account: id(rng),
        }
    }
}

impl Fake for Invitation {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Invitation {
            id: id(rng),
            code: format!("{:08X}", rng.gen::<u32>()),
            consumed: rng.gen_bool(0.3),
            belongs_to_account: id(rng),
        }
    }
}

impl Fake for Report {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Report {
            id: id(rng),
            report_type: pick(rng, REPORT_TYPES),
            concern: sentence(rng, 6),
            created_on: timestamp(rng),
            belongs_to_account: id(rng),
        }
    }
}

impl Fake for ValidIngredient {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ValidIngredient {
            id: id(rng),
            name: word(rng),
            variant: word(rng),
            description: sentence(rng, 8),
            warning: String::new(),
            contains_egg: rng.gen_bool(0.1),
            contains_dairy: rng.gen_bool(0.2),
            contains_peanut: rng.gen_bool(0.05),
            contains_tree_nut: rng.gen_bool(0.05),
            contains_soy: rng.gen_bool(0.1),
            contains_wheat: rng.gen_bool(0.2),
            contains_shellfish: rng.gen_bool(0.05),
            contains_sesame: rng.gen_bool(0.05),
            contains_fish: rng.gen_bool(0.05),
            contains_gluten: rng.gen_bool(0.2),
            animal_flesh: rng.gen_bool(0.2),
            animal_derived: rng.gen_bool(0.3),
            volumetric: rng.gen_bool(0.5),
            icon_path: String::new(),
        }
    }
}

impl Fake for ValidInstrument {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ValidInstrument {
            id: id(rng),
            name: word(rng),
            variant: word(rng),
            description: sentence(rng, 8),
            icon_path: String::new(),
        }
    }
}

impl Fake for ValidPreparation {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ValidPreparation {
            id: id(rng),
            name: word(rng),
            description: sentence(rng, 8),
            icon_path: String::new(),
        }
    }
}

impl Fake for ValidPreparationInstrument {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ValidPreparationInstrument {
            id: id(rng),
            instrument_id: id(rng),
            preparation_id: id(rng),
            notes: sentence(rng, 4),
        }
    }
}

impl Fake for ValidIngredientPreparation {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        ValidIngredientPreparation {
            id: id(rng),
            notes: sentence(rng, 4),
            valid_ingredient_id: id(rng),
            valid_preparation_id: id(rng),
        }
    }
}

impl Fake for Recipe {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Recipe {
            id: id(rng),
            name: sentence(rng, 2),
            source: format!("https://{}.example.com", word(rng)),
            description: sentence(rng, 10),
            inspired_by_recipe_id: rng.gen_bool(0.2).then(|| id(rng)),
            created_on: timestamp(rng),
            belongs_to_account: id(rng),
        }
    }
}

impl Fake for RecipeStep {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let min = rng.gen_range(30..=1_800);
        RecipeStep {
            id: id(rng),
            index: rng.gen_range(0..20),
            preparation_id: id(rng),
            prerequisite_step: 0,
            min_estimated_time_in_seconds: min,
            max_estimated_time_in_seconds: min + rng.gen_range(0..=1_800),
            temperature_in_celsius: rng.gen_bool(0.3).then(|| rng.gen_range(100..=250)),
            notes: sentence(rng, 5),
            why: sentence(rng, 5),
            created_on: timestamp(rng),
            belongs_to_recipe: id(rng),
        }
    }
}

impl Fake for RecipeStepIngredient {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        RecipeStepIngredient {
            id: id(rng),
            ingredient_id: Some(id(rng)),
            name: word(rng),
            quantity_type: pick(rng, QUANTITY_TYPES),
            quantity_value: quantity(rng),
            quantity_notes: String::new(),
            product_of_recipe_step: rng.gen_bool(0.1),
            ingredient_notes: sentence(rng, 3),
            belongs_to_recipe_step: id(rng),
        }
    }
}

impl Fake for RecipeStepProduct {
    fn fake<R: Rng + ?Sized>(rng: &mut R) -> Self {
        RecipeStepProduct {
            id: id(rng),
            name: word(rng),
            quantity_type: pick(rng, QUANTITY_TYPES),
            quantity_value: quantity(rng),
            quantity_notes: String::new(),
            belongs_to_recipe_step: id(rng),
        }
    }
}

/// A page of fakes shaped like a real list response.
pub fn fake_query_result<E: Fake>(filter: &QueryFilter) -> QueryResult<E> {
    let mut rng = rand::thread_rng();
    let count = rng.gen_range(1..=filter.limit.max(1) as usize);
    let data: Vec<E> = (0..count).map(|_| E::fake(&mut rng)).collect();

    QueryResult::new(
        data,
        Pagination {
            page: filter.page,
            limit: filter.limit,
            filtered_count: count as u64,
            total_count: count as u64,
        },
    )
}

/// Serves generated reads and forwards writes to the wrapped manager.
pub struct FakeEntityManager<E: Entity> {
    inner: Arc<dyn EntityDataManager<E>>,
}

impl<E: Entity> FakeEntityManager<E> {
    pub fn new(inner: Arc<dyn EntityDataManager<E>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: Fake> EntityDataManager<E> for FakeEntityManager<E> {
    async fn get(&self, _owner: &E::Owner, _id: u64) -> Result<E, DataStoreError> {
        Ok(E::fake(&mut rand::thread_rng()))
    }

    async fn list(&self, _owner: &E::Owner, filter: &QueryFilter) -> Result<QueryResult<E>, DataStoreError> {
        Ok(fake_query_result(filter))
    }

    async fn create(&self, owner: &E::Owner, input: &E::CreationInput, requester_id: u64) -> Result<E, DataStoreError> {
        self.inner.create(owner, input, requester_id).await
    }

    async fn update(
        &self,
        owner: &E::Owner,
        entity: &E,
        requester_id: u64,
        changes: &[FieldChangeSummary],
    ) -> Result<(), DataStoreError> {
        self.inner.update(owner, entity, requester_id, changes).await
    }

    async fn archive(&self, owner: &E::Owner, id: u64, requester_id: u64) -> Result<(), DataStoreError> {
        self.inner.archive(owner, id, requester_id).await
    }
}

/// Search results made up on the spot.
pub struct FakeSearcher<E> {
    _phantom: PhantomData<fn() -> E>,
}

impl<E> Default for FakeSearcher<E> {
    fn default() -> Self {
        Self { _phantom: PhantomData }
    }
}

#[async_trait]
impl<E: Fake> EntitySearcher<E> for FakeSearcher<E> {
    async fn search(&self, _query: &str) -> Result<Vec<E>, DataStoreError> {
        let mut rng = rand::thread_rng();
        let count = rng.gen_range(1..=5);
        Ok((0..count).map(|_| E::fake(&mut rng)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEntityStore;
    use crate::types::{AccountOwned, InvitationCreationInput};

    #[tokio::test]
    async fn reads_are_generated() {
        let inner = Arc::new(MockEntityStore::<Invitation>::new());
        let fake = FakeEntityManager::new(inner.clone());
        let owner = AccountOwned { account_id: 1 };

        let invitation = fake.get(&owner, 5).await.unwrap();
        assert!(!invitation.code.is_empty());

        let page = fake.list(&owner, &QueryFilter::default()).await.unwrap();
        assert!(!page.data.is_empty());
        assert!(page.data.len() <= QueryFilter::default().limit as usize);

        assert!(inner.calls().is_empty());
    }

    #[tokio::test]
    async fn writes_reach_the_wrapped_store() {
        let inner = Arc::new(MockEntityStore::<Invitation>::new());
        inner.expect_create(Ok(Invitation {
            id: 1,
            code: "ABC".into(),
            consumed: false,
            belongs_to_account: 1,
        }));
        let fake = FakeEntityManager::new(inner.clone());

        let input = InvitationCreationInput {
            code: "ABC".into(),
            consumed: false,
            belongs_to_account: 1,
        };
        fake.create(&AccountOwned { account_id: 1 }, &input, 7).await.unwrap();
        assert_eq!(inner.calls().len(), 1);
    }

    #[test]
    fn fake_recipe_step_values_are_sane() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let ingredient = RecipeStepIngredient::fake(&mut rng);
            assert!(ingredient.quantity_value > 0.0);
            assert!(QUANTITY_TYPES.contains(&ingredient.quantity_type.as_str()));

            let step = RecipeStep::fake(&mut rng);
            assert!(step.min_estimated_time_in_seconds <= step.max_estimated_time_in_seconds);
        }
    }
}
