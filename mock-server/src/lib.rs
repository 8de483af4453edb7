//! In-memory fake of the payment API, used by integration tests.
//!
//! Speaks the same wire format as the real service: form-encoded request
//! bodies with bracketed keys, JSON entities tagged with `object`, list
//! envelopes and `{"object":"error",...}` bodies on failure. Any secret key
//! (`skey_...`) is accepted; a public key (`pkey_...`) only for tokens.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub type Metadata = Map<String, Value>;

/// A decoded form body, in wire order.
type Fields = Vec<(String, String)>;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub object: String,
    pub id: String,
    pub livemode: bool,
    pub brand: String,
    pub last_digits: String,
    pub name: String,
    pub expiration_month: u32,
    pub expiration_year: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Token {
    pub object: String,
    pub id: String,
    pub livemode: bool,
    pub location: String,
    pub used: bool,
    pub card: Card,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub object: String,
    pub location: String,
    pub data: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    pub order: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Customer {
    pub object: String,
    pub id: String,
    pub livemode: bool,
    pub location: String,
    pub email: String,
    pub description: String,
    pub default_card: Option<String>,
    pub metadata: Metadata,
    pub cards: Page<Card>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Charge {
    pub object: String,
    pub id: String,
    pub livemode: bool,
    pub location: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub capture: bool,
    pub authorized: bool,
    pub paid: bool,
    pub reversed: bool,
    pub card: Option<Card>,
    pub customer: Option<String>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct Store {
    customers: Vec<Customer>,
    tokens: HashMap<String, Token>,
    charges: Vec<Charge>,
}

pub type Db = Arc<RwLock<Store>>;

/// Failure rendered as the API's error envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn not_found(kind: &str, id: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", format!("{kind} {id} was not found"))
    }

    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "object": "error",
            "location": format!("https://www.omise.co/api-errors#{}", self.code.replace('_', "-")),
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/cards", get(list_cards))
        .route("/tokens", post(create_token))
        .route("/tokens/{id}", get(get_token))
        .route("/charges", get(list_charges).post(create_charge))
        .route("/charges/{id}", get(get_charge))
        .route("/charges/{id}/capture", post(capture_charge))
        .route("/balance", get(get_balance))
        .layer(middleware::from_fn(require_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_key(request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|raw| String::from_utf8(raw).ok())
        .map(|credentials| credentials.trim_end_matches(':').to_string());

    let allowed = match key.as_deref() {
        Some(key) if key.starts_with("skey_") => true,
        Some(key) if key.starts_with("pkey_") => request.uri().path().starts_with("/tokens"),
        _ => false,
    };
    if !allowed {
        warn!(path = %request.uri().path(), "rejected request with bad credentials");
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "authentication_failure",
            "authentication failed",
        )
        .into_response();
    }
    next.run(request).await
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}_test_{}", Uuid::new_v4().simple())
}

fn field<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Collect `metadata[key]=value` pairs.
fn metadata(fields: &Fields) -> Metadata {
    fields
        .iter()
        .filter_map(|(k, v)| {
            let key = k.strip_prefix("metadata[")?.strip_suffix(']')?;
            Some((key.to_string(), Value::String(v.clone())))
        })
        .collect()
}

fn page<T: Clone>(items: &[T], query: &ListQuery, location: &str) -> Page<T> {
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    Page {
        object: "list".to_string(),
        location: location.to_string(),
        data: items.iter().skip(offset).take(limit).cloned().collect(),
        total: items.len(),
        offset,
        limit,
        order: "chronological".to_string(),
    }
}

/// Mark a token used and hand back its card.
fn consume_token(store: &mut Store, token_id: &str) -> Result<Card, ApiError> {
    let token = store
        .tokens
        .get_mut(token_id)
        .ok_or_else(|| ApiError::not_found("token", token_id))?;
    if token.used {
        return Err(ApiError::bad_request(
            "used_token",
            "token was already used",
        ));
    }
    token.used = true;
    Ok(token.card.clone())
}

// --- customers ---

async fn list_customers(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
) -> Json<Page<Customer>> {
    let store = db.read().await;
    Json(page(&store.customers, &query, "/customers"))
}

async fn create_customer(
    State(db): State<Db>,
    Form(fields): Form<Fields>,
) -> Result<Json<Customer>, ApiError> {
    let mut store = db.write().await;
    let id = new_id("cust");
    let mut cards = Vec::new();
    if let Some(token_id) = field(&fields, "card") {
        cards.push(consume_token(&mut store, token_id)?);
    }
    let location = format!("/customers/{id}");
    let customer = Customer {
        object: "customer".to_string(),
        livemode: false,
        email: field(&fields, "email").unwrap_or_default().to_string(),
        description: field(&fields, "description").unwrap_or_default().to_string(),
        default_card: cards.first().map(|c| c.id.clone()),
        metadata: metadata(&fields),
        cards: page(&cards, &ListQuery::default(), &format!("{location}/cards")),
        created_at: Utc::now(),
        location,
        id,
    };
    info!(id = %customer.id, "customer created");
    store.customers.push(customer.clone());
    Ok(Json(customer))
}

async fn get_customer(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let store = db.read().await;
    store
        .customers
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("customer", &id))
}

async fn update_customer(
    State(db): State<Db>,
    Path(id): Path<String>,
    Form(fields): Form<Fields>,
) -> Result<Json<Customer>, ApiError> {
    let mut store = db.write().await;
    let new_card = match field(&fields, "card") {
        Some(token_id) => Some(consume_token(&mut store, token_id)?),
        None => None,
    };
    let customer = store
        .customers
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| ApiError::not_found("customer", &id))?;

    if let Some(email) = field(&fields, "email") {
        customer.email = email.to_string();
    }
    if let Some(description) = field(&fields, "description") {
        customer.description = description.to_string();
    }
    customer.metadata.extend(metadata(&fields));
    if let Some(card) = new_card {
        if customer.default_card.is_none() {
            customer.default_card = Some(card.id.clone());
        }
        customer.cards.data.push(card);
        customer.cards.total = customer.cards.data.len();
    }
    if let Some(card_id) = field(&fields, "default_card") {
        if !customer.cards.data.iter().any(|c| c.id == card_id) {
            return Err(ApiError::not_found("card", card_id));
        }
        customer.default_card = Some(card_id.to_string());
    }
    Ok(Json(customer.clone()))
}

async fn delete_customer(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut store = db.write().await;
    let index = store
        .customers
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| ApiError::not_found("customer", &id))?;
    let removed = store.customers.remove(index);
    info!(id = %removed.id, "customer deleted");
    Ok(Json(json!({
        "object": "customer",
        "id": removed.id,
        "livemode": false,
        "deleted": true,
    })))
}

async fn list_cards(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Card>>, ApiError> {
    let store = db.read().await;
    let customer = store
        .customers
        .iter()
        .find(|c| c.id == id)
        .ok_or_else(|| ApiError::not_found("customer", &id))?;
    Ok(Json(page(&customer.cards.data, &query, &format!("/customers/{id}/cards"))))
}

// --- tokens ---

fn brand(number: &str) -> &'static str {
    match number.chars().next() {
        Some('4') => "Visa",
        Some('5') => "MasterCard",
        Some('3') => "JCB",
        _ => "Unknown",
    }
}

async fn create_token(
    State(db): State<Db>,
    Form(fields): Form<Fields>,
) -> Result<Json<Token>, ApiError> {
    let number: String = field(&fields, "card[number]")
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if number.len() < 12 || !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::bad_request("invalid_card", "number is invalid"));
    }
    let month = field(&fields, "card[expiration_month]")
        .and_then(|m| m.parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ApiError::bad_request("invalid_card", "expiration month is invalid"))?;
    let year = field(&fields, "card[expiration_year]")
        .and_then(|y| y.parse::<u32>().ok())
        .ok_or_else(|| ApiError::bad_request("invalid_card", "expiration year is invalid"))?;

    let now = Utc::now();
    let id = new_id("tokn");
    let token = Token {
        object: "token".to_string(),
        livemode: false,
        location: format!("/tokens/{id}"),
        used: false,
        card: Card {
            object: "card".to_string(),
            id: new_id("card"),
            livemode: false,
            brand: brand(&number).to_string(),
            last_digits: number[number.len() - 4..].to_string(),
            name: field(&fields, "card[name]").unwrap_or_default().to_string(),
            expiration_month: month,
            expiration_year: year,
            created_at: now,
        },
        created_at: now,
        id,
    };
    db.write().await.tokens.insert(token.id.clone(), token.clone());
    Ok(Json(token))
}

async fn get_token(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Token>, ApiError> {
    let store = db.read().await;
    store
        .tokens
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("token", &id))
}

// --- charges ---

async fn list_charges(
    State(db): State<Db>,
    Query(query): Query<ListQuery>,
) -> Json<Page<Charge>> {
    let store = db.read().await;
    Json(page(&store.charges, &query, "/charges"))
}

async fn create_charge(
    State(db): State<Db>,
    Form(fields): Form<Fields>,
) -> Result<Json<Charge>, ApiError> {
    let amount = field(&fields, "amount")
        .and_then(|a| a.parse::<i64>().ok())
        .filter(|a| *a > 0)
        .ok_or_else(|| ApiError::bad_request("invalid_charge", "amount must be a positive integer"))?;
    let currency = field(&fields, "currency")
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::bad_request("invalid_charge", "currency is required"))?
        .to_lowercase();
    let capture = field(&fields, "capture") != Some("false");

    let mut store = db.write().await;
    let customer_id = field(&fields, "customer").map(str::to_string);
    let card = match (field(&fields, "card"), &customer_id) {
        (Some(token_id), None) => consume_token(&mut store, token_id)?,
        (card_id, Some(customer_id)) => {
            let customer = store
                .customers
                .iter()
                .find(|c| &c.id == customer_id)
                .ok_or_else(|| ApiError::not_found("customer", customer_id))?;
            let wanted = card_id.or(customer.default_card.as_deref());
            customer
                .cards
                .data
                .iter()
                .find(|c| Some(c.id.as_str()) == wanted)
                .cloned()
                .ok_or_else(|| ApiError::bad_request("invalid_charge", "customer has no usable card"))?
        }
        (None, None) => {
            return Err(ApiError::bad_request(
                "invalid_charge",
                "a card or a customer is required",
            ))
        }
    };

    let id = new_id("chrg");
    let charge = Charge {
        object: "charge".to_string(),
        livemode: false,
        location: format!("/charges/{id}"),
        status: if capture { "successful" } else { "pending" }.to_string(),
        amount,
        currency,
        description: field(&fields, "description").map(str::to_string),
        capture,
        authorized: true,
        paid: capture,
        reversed: false,
        card: Some(card),
        customer: customer_id,
        metadata: metadata(&fields),
        created_at: Utc::now(),
        id,
    };
    info!(id = %charge.id, amount, "charge created");
    store.charges.push(charge.clone());
    Ok(Json(charge))
}

async fn get_charge(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Charge>, ApiError> {
    let store = db.read().await;
    store
        .charges
        .iter()
        .find(|c| c.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("charge", &id))
}

async fn capture_charge(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Charge>, ApiError> {
    let mut store = db.write().await;
    let charge = store
        .charges
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| ApiError::not_found("charge", &id))?;
    if charge.paid {
        return Err(ApiError::bad_request("failed_capture", "charge was already captured"));
    }
    charge.paid = true;
    charge.status = "successful".to_string();
    Ok(Json(charge.clone()))
}

async fn get_balance(State(db): State<Db>) -> Json<Value> {
    let store = db.read().await;
    let total: i64 = store.charges.iter().filter(|c| c.paid).map(|c| c.amount).sum();
    Json(json!({
        "object": "balance",
        "livemode": false,
        "location": "/balance",
        "available": total,
        "total": total,
        "currency": "thb",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn metadata_collects_bracketed_keys() {
        let form = fields(&[("email", "a@b.com"), ("metadata[plan]", "gold"), ("metadata[seats]", "3")]);
        let meta = metadata(&form);
        assert_eq!(meta.len(), 2);
        assert_eq!(meta["plan"], "gold");
        assert_eq!(meta["seats"], "3");
    }

    #[test]
    fn page_applies_offset_and_limit() {
        let items: Vec<u32> = (0..5).collect();
        let query = ListQuery {
            offset: Some(2),
            limit: Some(2),
        };
        let p = page(&items, &query, "/things");
        assert_eq!(p.data, vec![2, 3]);
        assert_eq!(p.total, 5);
        assert_eq!(p.offset, 2);
        assert_eq!(p.limit, 2);
    }

    #[test]
    fn page_clamps_limit() {
        let items: Vec<u32> = Vec::new();
        let query = ListQuery {
            offset: None,
            limit: Some(1000),
        };
        assert_eq!(page(&items, &query, "/things").limit, MAX_LIMIT);
    }

    #[test]
    fn error_envelope_shape() {
        let err = ApiError::not_found("customer", "cust_x");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "not_found");
        assert_eq!(err.message, "customer cust_x was not found");
    }

    #[test]
    fn brand_from_leading_digit() {
        assert_eq!(brand("4242424242424242"), "Visa");
        assert_eq!(brand("5555555555554444"), "MasterCard");
        assert_eq!(brand("9999"), "Unknown");
    }
}
