//! Resource entities and request parameter structs.
//!
//! # Design
//! Entities are immutable snapshots decoded from one response. Every field
//! is optional on the wire: a missing or `null` field takes the type's
//! default, while a field of the wrong JSON type fails decoding. Unknown
//! fields are ignored.
//!
//! Parameter structs skip unset fields when serialized, so only what the
//! caller set is sent.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::list::List;
use crate::shape::Entity;

pub type Metadata = Map<String, Value>;

/// `null` decodes to `T::default()`; any other value must decode as `T`.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Customer {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub livemode: bool,
    pub location: Option<String>,
    pub default_card: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub email: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub metadata: Metadata,
    pub cards: Option<List<Card>>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "nullable")]
    pub deleted: bool,
}

impl Entity for Customer {
    const OBJECT: &'static str = "customer";
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Card {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub livemode: bool,
    pub location: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub country: String,
    #[serde(deserialize_with = "nullable")]
    pub city: String,
    #[serde(deserialize_with = "nullable")]
    pub postal_code: String,
    #[serde(deserialize_with = "nullable")]
    pub financing: String,
    #[serde(deserialize_with = "nullable")]
    pub bank: String,
    #[serde(deserialize_with = "nullable")]
    pub brand: String,
    #[serde(deserialize_with = "nullable")]
    pub last_digits: String,
    #[serde(deserialize_with = "nullable")]
    pub name: String,
    #[serde(deserialize_with = "nullable")]
    pub expiration_month: u32,
    #[serde(deserialize_with = "nullable")]
    pub expiration_year: u32,
    #[serde(deserialize_with = "nullable")]
    pub fingerprint: String,
    #[serde(deserialize_with = "nullable")]
    pub security_code_check: bool,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "nullable")]
    pub deleted: bool,
}

impl Entity for Card {
    const OBJECT: &'static str = "card";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeStatus {
    Failed,
    Expired,
    Pending,
    Reversed,
    Successful,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Charge {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub livemode: bool,
    pub location: Option<String>,
    pub status: Option<ChargeStatus>,
    /// In the smallest currency unit.
    #[serde(deserialize_with = "nullable")]
    pub amount: i64,
    #[serde(deserialize_with = "nullable")]
    pub currency: String,
    #[serde(deserialize_with = "nullable")]
    pub description: String,
    #[serde(deserialize_with = "nullable")]
    pub capture: bool,
    #[serde(deserialize_with = "nullable")]
    pub authorized: bool,
    #[serde(deserialize_with = "nullable")]
    pub reversed: bool,
    #[serde(deserialize_with = "nullable")]
    pub paid: bool,
    #[serde(deserialize_with = "nullable")]
    pub refunded_amount: i64,
    pub transaction: Option<String>,
    pub card: Option<Card>,
    pub refunds: Option<List<Refund>>,
    pub failure_code: Option<String>,
    pub failure_message: Option<String>,
    pub customer: Option<String>,
    pub ip: Option<String>,
    pub return_uri: Option<String>,
    pub authorize_uri: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "nullable")]
    pub deleted: bool,
}

impl Entity for Charge {
    const OBJECT: &'static str = "charge";
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Token {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub livemode: bool,
    pub location: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub used: bool,
    pub card: Option<Card>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Token {
    const OBJECT: &'static str = "token";
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Refund {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub livemode: bool,
    pub location: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub amount: i64,
    #[serde(deserialize_with = "nullable")]
    pub currency: String,
    #[serde(deserialize_with = "nullable")]
    pub charge: String,
    pub transaction: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub voided: bool,
    #[serde(deserialize_with = "nullable")]
    pub metadata: Metadata,
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Refund {
    const OBJECT: &'static str = "refund";
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Balance {
    #[serde(deserialize_with = "nullable")]
    pub livemode: bool,
    pub location: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub available: i64,
    #[serde(deserialize_with = "nullable")]
    pub total: i64,
    #[serde(deserialize_with = "nullable")]
    pub currency: String,
}

impl Entity for Balance {
    const OBJECT: &'static str = "balance";
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateCustomer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// A token id; the card is attached to the new customer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCustomer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_year: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateCharge {
    pub amount: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    /// A token id, or a card id when `customer` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateCharge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateRefund {
    pub amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateToken {
    pub card: CardParams,
}

/// Raw card details, only ever sent to the vault host.
#[derive(Clone, Default, Serialize)]
pub struct CardParams {
    pub name: String,
    pub number: String,
    pub expiration_month: u32,
    pub expiration_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl fmt::Debug for CardParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last4 = self
            .number
            .get(self.number.len().saturating_sub(4)..)
            .unwrap_or_default();
        f.debug_struct("CardParams")
            .field("name", &self.name)
            .field("number", &format_args!("****{last4}"))
            .field("expiration_month", &self.expiration_month)
            .field("expiration_year", &self.expiration_year)
            .field("security_code", &self.security_code.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Params;
    use crate::shape::decode_entity;
    use serde_json::json;

    #[test]
    fn customer_with_only_some_fields() {
        let customer: Customer = decode_entity(json!({
            "object": "customer",
            "id": "cust_1",
            "email": "a@b.com"
        }))
        .unwrap();
        assert_eq!(customer.id, "cust_1");
        assert_eq!(customer.email, "a@b.com");
        assert_eq!(customer.description, "");
        assert!(!customer.deleted);
        assert!(customer.cards.is_none());
        assert!(customer.metadata.is_empty());
    }

    #[test]
    fn null_fields_take_defaults() {
        let customer: Customer = decode_entity(json!({
            "object": "customer",
            "id": "cust_1",
            "email": null,
            "livemode": null,
            "metadata": null,
            "default_card": null,
            "deleted": null,
            "created_at": null
        }))
        .unwrap();
        assert_eq!(customer, Customer { id: "cust_1".into(), ..Customer::default() });
    }

    #[test]
    fn wrong_field_type_is_an_error() {
        let err = decode_entity::<Customer>(json!({ "id": "cust_1", "deleted": "true" }));
        assert!(err.is_err());

        let err = decode_entity::<Card>(json!({ "id": "card_1", "expiration_month": "12" }));
        assert!(err.is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let card: Card = decode_entity(json!({
            "object": "card",
            "id": "card_1",
            "brand": "Visa",
            "tokenization_method": "applepay"
        }))
        .unwrap();
        assert_eq!(card.brand, "Visa");
    }

    #[test]
    fn deleted_customer() {
        let customer: Customer = decode_entity(json!({
            "object": "customer",
            "id": "cust_1",
            "livemode": false,
            "deleted": true
        }))
        .unwrap();
        assert!(customer.deleted);
    }

    #[test]
    fn customer_embeds_card_list() {
        let customer: Customer = decode_entity(json!({
            "object": "customer",
            "id": "cust_1",
            "default_card": "card_1",
            "cards": {
                "object": "list",
                "data": [{ "object": "card", "id": "card_1", "last_digits": "4242" }],
                "total": 1,
                "offset": 0,
                "limit": 20
            },
            "created_at": "2024-05-01T08:00:00Z"
        }))
        .unwrap();
        let cards = customer.cards.unwrap();
        assert_eq!(cards.total, 1);
        assert_eq!(cards.data[0].last_digits, "4242");
        assert!(customer.created_at.is_some());
    }

    #[test]
    fn embedded_list_with_bad_item_fails() {
        let result = decode_entity::<Customer>(json!({
            "id": "cust_1",
            "cards": {
                "data": [{ "object": "charge", "id": "chrg_1" }],
                "total": 1, "offset": 0, "limit": 20
            }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn charge_with_card_and_status() {
        let charge: Charge = decode_entity(json!({
            "object": "charge",
            "id": "chrg_1",
            "status": "successful",
            "amount": 100000,
            "currency": "thb",
            "paid": true,
            "card": { "object": "card", "id": "card_1", "brand": "Visa" },
            "failure_code": null
        }))
        .unwrap();
        assert_eq!(charge.status, Some(ChargeStatus::Successful));
        assert_eq!(charge.amount, 100_000);
        assert!(charge.paid);
        assert_eq!(charge.card.unwrap().brand, "Visa");
        assert!(charge.failure_code.is_none());
    }

    #[test]
    fn create_customer_params_skip_unset_fields() {
        let mut metadata = Metadata::new();
        metadata.insert("plan".into(), json!("gold"));
        let input = CreateCustomer {
            email: Some("john@example.com".into()),
            description: None,
            card: Some("tokn_1".into()),
            metadata: Some(metadata),
        };
        let params = Params::from_serialize(&input).unwrap();
        assert_eq!(
            params.encode().unwrap(),
            "email=john%40example.com&card=tokn_1&metadata[plan]=gold"
        );
    }

    #[test]
    fn card_params_debug_hides_number() {
        let card = CardParams {
            name: "Somchai".into(),
            number: "4242424242424242".into(),
            expiration_month: 10,
            expiration_year: 2030,
            security_code: Some("123".into()),
            ..CardParams::default()
        };
        let printed = format!("{card:?}");
        assert!(printed.contains("****4242"));
        assert!(!printed.contains("4242424242424242"));
        assert!(!printed.contains("123"));
    }
}
