//! In-process stand-in for the REST backend, served on an ephemeral port.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use api_types::{
    Id,
    auth::{LoginRequest, LoginResponse},
    budget::BudgetSummary,
    coffee::{Coffee, CoffeeNew},
    gift::{Gift, GiftNew},
    inventory::InventorySummary,
    person::{Person, PersonNew},
    roaster::{Roaster, RoasterNew},
};
use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use client::{Client, ClientError, MemoryTokenStore, TokenStore};
use rust_decimal::Decimal;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "wonderland";
pub const TOKEN: &str = "secret-token";

#[derive(Debug, Default)]
pub struct Store {
    next_id: Id,
    pub persons: Vec<Person>,
    pub gifts: Vec<Gift>,
    pub roasters: Vec<Roaster>,
    pub coffees: Vec<Coffee>,
    /// Number of DELETE requests that reached a handler.
    pub deletes: usize,
    /// Answer every mutation with a 500.
    pub fail_writes: bool,
    /// Answer every mutation with this status instead.
    pub reject_writes: Option<StatusCode>,
    /// Answer summary reads with a 500.
    pub fail_summary: bool,
    /// Reject the otherwise valid token.
    pub revoked: bool,
}

impl Store {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn check_write(&self) -> Result<(), ApiError> {
        if self.fail_writes {
            return Err(ApiError::internal("database unavailable"));
        }
        if let Some(status) = self.reject_writes {
            return Err(ApiError {
                status,
                message: format!("write rejected with {}", status.as_u16()),
            });
        }
        Ok(())
    }

    fn person_name(&self, id: Id) -> Result<String, ApiError> {
        self.persons
            .iter()
            .find(|person| person.id == id)
            .map(|person| person.name.clone())
            .ok_or_else(|| ApiError::not_found(format!("Person not found with id: {id}")))
    }

    fn roaster_name(&self, id: Id) -> Result<String, ApiError> {
        self.roasters
            .iter()
            .find(|roaster| roaster.id == id)
            .map(|roaster| roaster.name.clone())
            .ok_or_else(|| ApiError::not_found(format!("Roaster not found with id: {id}")))
    }

    fn person_view(&self, person: &Person) -> Person {
        let gifts: Vec<Gift> = engine::children_of(&self.gifts, person.id)
            .into_iter()
            .cloned()
            .collect();
        Person {
            total_spent: engine::total_spent(&gifts),
            gifts,
            ..person.clone()
        }
    }

    fn coffee_view(&self, coffee: &Coffee) -> Coffee {
        let mut coffee = coffee.clone();
        engine::enrich_coffee(&mut coffee, today());
        coffee
    }
}

type Shared = Arc<Mutex<Store>>;

fn lock(store: &Shared) -> MutexGuard<'_, Store> {
    store.lock().unwrap()
}

/// Token store holding a token it cannot delete.
#[derive(Debug)]
pub struct StuckTokenStore(pub &'static str);

impl TokenStore for StuckTokenStore {
    fn load(&self) -> client::Result<Option<String>> {
        Ok(Some(self.0.to_string()))
    }

    fn save(&self, _token: &str) -> client::Result<()> {
        Ok(())
    }

    fn clear(&self) -> client::Result<()> {
        Err(ClientError::Io(std::io::Error::other("read-only file system")))
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "message": self.message,
            "error": self.status.canonical_reason(),
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Handle to a running mock backend.
#[derive(Debug, Clone)]
pub struct Backend {
    pub base_url: String,
    store: Shared,
}

impl Backend {
    pub async fn spawn() -> Self {
        let store = Shared::default();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(store.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}/api"),
            store,
        }
    }

    pub fn store(&self) -> MutexGuard<'_, Store> {
        lock(&self.store)
    }

    /// Client without a stored token.
    pub fn client(&self) -> Client {
        Client::new(&self.base_url, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    /// Client already holding the valid token.
    pub fn signed_in_client(&self) -> Client {
        Client::new(&self.base_url, Arc::new(MemoryTokenStore::with_token(TOKEN))).unwrap()
    }

    pub fn add_person(&self, name: &str) -> Id {
        let mut store = self.store();
        let id = store.next_id();
        store.persons.push(Person {
            id,
            name: name.to_string(),
            gifts: Vec::new(),
            total_spent: Decimal::ZERO,
        });
        id
    }

    pub fn add_gift(&self, person_id: Id, description: &str, price: Decimal) -> Id {
        let mut store = self.store();
        let id = store.next_id();
        let person_name = store.person_name(person_id).unwrap();
        store.gifts.push(Gift {
            id,
            description: description.to_string(),
            price,
            person_id,
            person_name,
        });
        id
    }

    pub fn add_roaster(&self, name: &str) -> Id {
        let mut store = self.store();
        let id = store.next_id();
        store.roasters.push(Roaster {
            id,
            name: name.to_string(),
            location: None,
            website: None,
            notes: None,
            coffees: Vec::new(),
            total_spent: Decimal::ZERO,
            coffee_count: 0,
        });
        id
    }

    pub fn add_coffee(
        &self,
        roaster_id: Id,
        name: &str,
        initial: i64,
        current: i64,
        price: Decimal,
        roast_date: NaiveDate,
    ) -> Id {
        let mut store = self.store();
        let id = store.next_id();
        let roaster_name = store.roaster_name(roaster_id).unwrap();
        store.coffees.push(Coffee {
            id,
            coffee_name: name.to_string(),
            roast_date,
            purchase_date: roast_date,
            initial_weight: Decimal::from(initial),
            current_weight: Decimal::from(current),
            origin: None,
            roast_level: None,
            processing_method: None,
            price: Some(price),
            notes: None,
            roaster_id,
            roaster_name,
            days_since_roast: None,
            percentage_remaining: None,
        });
        id
    }
}

fn router(store: Shared) -> Router {
    let protected = Router::new()
        .route("/persons", get(list_persons).post(create_person))
        .route(
            "/persons/{id}",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/gifts", get(list_gifts).post(create_gift))
        .route(
            "/gifts/{id}",
            get(get_gift).put(update_gift).delete(delete_gift),
        )
        .route("/gifts/person/{id}", get(gifts_of_person))
        .route("/budget/summary", get(budget_summary))
        .route("/roasters", get(list_roasters).post(create_roaster))
        .route(
            "/roasters/{id}",
            get(get_roaster).put(update_roaster).delete(delete_roaster),
        )
        .route("/coffees", get(list_coffees).post(create_coffee))
        .route(
            "/coffees/{id}",
            get(get_coffee).put(update_coffee).delete(delete_coffee),
        )
        .route("/coffees/roaster/{id}", get(coffees_of_roaster))
        .route("/coffees/{id}/consume", post(consume_coffee))
        .route("/inventory/summary", get(inventory_summary))
        .route_layer(middleware::from_fn_with_state(store.clone(), auth));

    let api = Router::new()
        .route("/auth/login", post(login))
        .merge(protected);

    Router::new().nest("/api", api).with_state(store)
}

async fn auth(
    State(store): State<Shared>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = format!("Bearer {TOKEN}");
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str());
    let revoked = lock(&store).revoked;
    if !authorized || revoked {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

async fn login(Json(payload): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    if payload.username != USERNAME || payload.password != PASSWORD {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(LoginResponse {
        token: TOKEN.to_string(),
        kind: "Bearer".to_string(),
    }))
}

async fn list_persons(State(store): State<Shared>) -> ApiResult<Vec<Person>> {
    let store = lock(&store);
    Ok(Json(
        store
            .persons
            .iter()
            .map(|person| store.person_view(person))
            .collect(),
    ))
}

async fn get_person(State(store): State<Shared>, Path(id): Path<Id>) -> ApiResult<Person> {
    let store = lock(&store);
    let person = store
        .persons
        .iter()
        .find(|person| person.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Person not found with id: {id}")))?;
    Ok(Json(store.person_view(person)))
}

async fn create_person(
    State(store): State<Shared>,
    Json(payload): Json<PersonNew>,
) -> ApiResult<Person> {
    let mut store = lock(&store);
    store.check_write()?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let person = Person {
        id: store.next_id(),
        name: payload.name,
        gifts: Vec::new(),
        total_spent: Decimal::ZERO,
    };
    store.persons.push(person.clone());
    Ok(Json(person))
}

async fn update_person(
    State(store): State<Shared>,
    Path(id): Path<Id>,
    Json(payload): Json<PersonNew>,
) -> ApiResult<Person> {
    let mut store = lock(&store);
    store.check_write()?;
    let person = store
        .persons
        .iter_mut()
        .find(|person| person.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Person not found with id: {id}")))?;
    person.name = payload.name.clone();
    let person = person.clone();
    for gift in store.gifts.iter_mut().filter(|gift| gift.person_id == id) {
        gift.person_name = payload.name.clone();
    }
    Ok(Json(store.person_view(&person)))
}

async fn delete_person(
    State(store): State<Shared>,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let mut store = lock(&store);
    store.deletes += 1;
    store.check_write()?;
    store.person_name(id)?;
    store.persons.retain(|person| person.id != id);
    store.gifts.retain(|gift| gift.person_id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_gifts(State(store): State<Shared>) -> ApiResult<Vec<Gift>> {
    Ok(Json(lock(&store).gifts.clone()))
}

async fn get_gift(State(store): State<Shared>, Path(id): Path<Id>) -> ApiResult<Gift> {
    lock(&store)
        .gifts
        .iter()
        .find(|gift| gift.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Gift not found with id: {id}")))
}

async fn gifts_of_person(State(store): State<Shared>, Path(id): Path<Id>) -> ApiResult<Vec<Gift>> {
    let store = lock(&store);
    store.person_name(id)?;
    Ok(Json(
        engine::children_of(&store.gifts, id)
            .into_iter()
            .cloned()
            .collect(),
    ))
}

fn check_gift(payload: &GiftNew) -> Result<(), ApiError> {
    if payload.description.trim().is_empty() {
        return Err(ApiError::bad_request("Description is required"));
    }
    if payload.price < Decimal::ZERO {
        return Err(ApiError::bad_request("Price must not be negative"));
    }
    Ok(())
}

async fn create_gift(State(store): State<Shared>, Json(payload): Json<GiftNew>) -> ApiResult<Gift> {
    let mut store = lock(&store);
    store.check_write()?;
    check_gift(&payload)?;
    let person_name = store.person_name(payload.person_id)?;
    let gift = Gift {
        id: store.next_id(),
        description: payload.description,
        price: payload.price,
        person_id: payload.person_id,
        person_name,
    };
    store.gifts.push(gift.clone());
    Ok(Json(gift))
}

async fn update_gift(
    State(store): State<Shared>,
    Path(id): Path<Id>,
    Json(payload): Json<GiftNew>,
) -> ApiResult<Gift> {
    let mut store = lock(&store);
    store.check_write()?;
    check_gift(&payload)?;
    let person_name = store.person_name(payload.person_id)?;
    let gift = store
        .gifts
        .iter_mut()
        .find(|gift| gift.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Gift not found with id: {id}")))?;
    gift.description = payload.description;
    gift.price = payload.price;
    gift.person_id = payload.person_id;
    gift.person_name = person_name;
    Ok(Json(gift.clone()))
}

async fn delete_gift(
    State(store): State<Shared>,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let mut store = lock(&store);
    store.deletes += 1;
    store.check_write()?;
    if !store.gifts.iter().any(|gift| gift.id == id) {
        return Err(ApiError::not_found(format!("Gift not found with id: {id}")));
    }
    store.gifts.retain(|gift| gift.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn budget_summary(
    State(store): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<BudgetSummary> {
    let store = lock(&store);
    if store.fail_summary {
        return Err(ApiError::internal("summary unavailable"));
    }
    let total_budget = match query.get("totalBudget") {
        Some(raw) => raw
            .parse::<Decimal>()
            .map_err(|_| ApiError::bad_request("totalBudget must be a number"))?,
        None => engine::DEFAULT_TOTAL_BUDGET,
    };
    Ok(Json(engine::budget_summary(
        &store.persons,
        &store.gifts,
        total_budget,
    )))
}

async fn list_roasters(State(store): State<Shared>) -> ApiResult<Vec<Roaster>> {
    let store = lock(&store);
    let totals = engine::owner_totals(&store.roasters, &store.coffees);
    Ok(Json(
        store
            .roasters
            .iter()
            .map(|roaster| Roaster {
                total_spent: totals.get(&roaster.id).copied().unwrap_or_default(),
                coffee_count: engine::children_of(&store.coffees, roaster.id).len(),
                ..roaster.clone()
            })
            .collect(),
    ))
}

async fn get_roaster(State(store): State<Shared>, Path(id): Path<Id>) -> ApiResult<Roaster> {
    lock(&store)
        .roasters
        .iter()
        .find(|roaster| roaster.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Roaster not found with id: {id}")))
}

async fn create_roaster(
    State(store): State<Shared>,
    Json(payload): Json<RoasterNew>,
) -> ApiResult<Roaster> {
    let mut store = lock(&store);
    store.check_write()?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let roaster = Roaster {
        id: store.next_id(),
        name: payload.name,
        location: payload.location,
        website: payload.website,
        notes: payload.notes,
        coffees: Vec::new(),
        total_spent: Decimal::ZERO,
        coffee_count: 0,
    };
    store.roasters.push(roaster.clone());
    Ok(Json(roaster))
}

async fn update_roaster(
    State(store): State<Shared>,
    Path(id): Path<Id>,
    Json(payload): Json<RoasterNew>,
) -> ApiResult<Roaster> {
    let mut store = lock(&store);
    store.check_write()?;
    let roaster = store
        .roasters
        .iter_mut()
        .find(|roaster| roaster.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Roaster not found with id: {id}")))?;
    roaster.name = payload.name;
    roaster.location = payload.location;
    roaster.website = payload.website;
    roaster.notes = payload.notes;
    Ok(Json(roaster.clone()))
}

async fn delete_roaster(
    State(store): State<Shared>,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let mut store = lock(&store);
    store.deletes += 1;
    store.check_write()?;
    store.roaster_name(id)?;
    store.roasters.retain(|roaster| roaster.id != id);
    store.coffees.retain(|coffee| coffee.roaster_id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_coffees(State(store): State<Shared>) -> ApiResult<Vec<Coffee>> {
    let store = lock(&store);
    Ok(Json(
        store
            .coffees
            .iter()
            .map(|coffee| store.coffee_view(coffee))
            .collect(),
    ))
}

async fn get_coffee(State(store): State<Shared>, Path(id): Path<Id>) -> ApiResult<Coffee> {
    let store = lock(&store);
    store
        .coffees
        .iter()
        .find(|coffee| coffee.id == id)
        .map(|coffee| Json(store.coffee_view(coffee)))
        .ok_or_else(|| ApiError::not_found(format!("Coffee not found with id: {id}")))
}

async fn coffees_of_roaster(
    State(store): State<Shared>,
    Path(id): Path<Id>,
) -> ApiResult<Vec<Coffee>> {
    let store = lock(&store);
    store.roaster_name(id)?;
    Ok(Json(
        engine::children_of(&store.coffees, id)
            .into_iter()
            .map(|coffee| store.coffee_view(coffee))
            .collect(),
    ))
}

fn coffee_from(id: Id, payload: CoffeeNew, roaster_name: String) -> Result<Coffee, ApiError> {
    if payload.initial_weight <= Decimal::ZERO {
        return Err(ApiError::bad_request("Initial weight must be positive"));
    }
    let coffee = Coffee {
        id,
        coffee_name: payload.coffee_name,
        roast_date: payload.roast_date,
        purchase_date: payload.purchase_date,
        initial_weight: payload.initial_weight,
        current_weight: payload.current_weight.unwrap_or(payload.initial_weight),
        origin: payload.origin,
        roast_level: payload.roast_level,
        processing_method: payload.processing_method,
        price: payload.price,
        notes: payload.notes,
        roaster_id: payload.roaster_id,
        roaster_name,
        days_since_roast: None,
        percentage_remaining: None,
    };
    engine::validate_coffee(&coffee).map_err(|err| ApiError::bad_request(err.to_string()))?;
    Ok(coffee)
}

async fn create_coffee(
    State(store): State<Shared>,
    Json(payload): Json<CoffeeNew>,
) -> ApiResult<Coffee> {
    let mut store = lock(&store);
    store.check_write()?;
    let roaster_name = store.roaster_name(payload.roaster_id)?;
    let id = store.next_id();
    let coffee = coffee_from(id, payload, roaster_name)?;
    store.coffees.push(coffee.clone());
    Ok(Json(store.coffee_view(&coffee)))
}

async fn update_coffee(
    State(store): State<Shared>,
    Path(id): Path<Id>,
    Json(payload): Json<CoffeeNew>,
) -> ApiResult<Coffee> {
    let mut store = lock(&store);
    store.check_write()?;
    let roaster_name = store.roaster_name(payload.roaster_id)?;
    let updated = coffee_from(id, payload, roaster_name)?;
    let coffee = store
        .coffees
        .iter_mut()
        .find(|coffee| coffee.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Coffee not found with id: {id}")))?;
    *coffee = updated.clone();
    Ok(Json(store.coffee_view(&updated)))
}

async fn delete_coffee(
    State(store): State<Shared>,
    Path(id): Path<Id>,
) -> Result<StatusCode, ApiError> {
    let mut store = lock(&store);
    store.deletes += 1;
    store.check_write()?;
    if !store.coffees.iter().any(|coffee| coffee.id == id) {
        return Err(ApiError::not_found(format!("Coffee not found with id: {id}")));
    }
    store.coffees.retain(|coffee| coffee.id != id);
    Ok(StatusCode::NO_CONTENT)
}

async fn consume_coffee(
    State(store): State<Shared>,
    Path(id): Path<Id>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Coffee> {
    let mut store = lock(&store);
    store.check_write()?;
    let amount = query
        .get("amount")
        .and_then(|raw| raw.parse::<Decimal>().ok())
        .ok_or_else(|| ApiError::bad_request("amount is required"))?;
    let coffee = store
        .coffees
        .iter_mut()
        .find(|coffee| coffee.id == id)
        .ok_or_else(|| ApiError::not_found(format!("Coffee not found with id: {id}")))?;
    coffee.current_weight =
        engine::consume(coffee, amount).map_err(|err| ApiError::bad_request(err.to_string()))?;
    let coffee = coffee.clone();
    Ok(Json(store.coffee_view(&coffee)))
}

async fn inventory_summary(State(store): State<Shared>) -> ApiResult<InventorySummary> {
    let store = lock(&store);
    if store.fail_summary {
        return Err(ApiError::internal("summary unavailable"));
    }
    Ok(Json(engine::inventory_summary(
        &store.roasters,
        &store.coffees,
        today(),
    )))
}
