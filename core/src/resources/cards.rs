use serde::Serialize;

use super::{entity, list, segment};
use crate::client::OmiseClient;
use crate::error::Result;
use crate::http::{HttpMethod, Transport};
use crate::list::List;
use crate::types::Card;

/// Cards attached to one customer.
pub struct Cards<'a, T> {
    client: &'a OmiseClient<T>,
    customer_id: &'a str,
}

impl<'a, T: Transport> Cards<'a, T> {
    pub(crate) fn new(client: &'a OmiseClient<T>, customer_id: &'a str) -> Self {
        Self {
            client,
            customer_id,
        }
    }

    fn path(&self, card_id: Option<&str>) -> String {
        let base = format!("customers/{}/cards", segment(self.customer_id));
        match card_id {
            Some(card_id) => format!("{base}/{}", segment(card_id)),
            None => base,
        }
    }

    pub fn list<P: Serialize + ?Sized>(&self, params: &P) -> Result<List<Card>> {
        self.client
            .execute(HttpMethod::Get, &self.path(None), list::<Card>().query(params)?)
    }

    pub fn retrieve(&self, card_id: &str) -> Result<Card> {
        self.client
            .execute(HttpMethod::Get, &self.path(Some(card_id)), entity::<Card>())
    }

    pub fn update<P: Serialize + ?Sized>(&self, card_id: &str, params: &P) -> Result<Card> {
        self.client.execute(
            HttpMethod::Patch,
            &self.path(Some(card_id)),
            entity::<Card>().form(params)?,
        )
    }

    pub fn destroy(&self, card_id: &str) -> Result<Card> {
        self.client
            .execute(HttpMethod::Delete, &self.path(Some(card_id)), entity::<Card>())
    }
}

#[cfg(test)]
mod tests {
    use crate::http::HttpMethod;
    use crate::list::ListParams;
    use crate::resources::testing::client;
    use crate::types::UpdateCard;

    const CARD: &str = r#"{"object":"card","id":"card_1","last_digits":"4242","expiration_month":12}"#;

    #[test]
    fn list_is_scoped_to_customer() {
        let client = client(&[
            r#"{"object":"list","data":[{"object":"card","id":"card_1"}],"total":1,"offset":0,"limit":20}"#,
        ]);
        let cards = client.cards("cust_1").list(&ListParams::new()).unwrap();
        assert_eq!(cards.data[0].id, "card_1");
        assert_eq!(client.transport().last().url, "https://api.test/customers/cust_1/cards");
    }

    #[test]
    fn update_and_destroy_target_the_card() {
        let client = client(&[CARD, r#"{"object":"card","id":"card_1","deleted":true}"#]);
        let input = UpdateCard {
            name: Some("JOHN DOE".into()),
            expiration_month: Some(11),
            ..UpdateCard::default()
        };
        let card = client.cards("cust_1").update("card_1", &input).unwrap();
        assert_eq!(card.expiration_month, 12);
        let req = client.transport().last();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "https://api.test/customers/cust_1/cards/card_1");
        assert_eq!(req.body.as_deref(), Some("name=JOHN%20DOE&expiration_month=11"));

        let card = client.cards("cust_1").destroy("card_1").unwrap();
        assert!(card.deleted);
        assert_eq!(client.transport().last().method, HttpMethod::Delete);
    }

    #[test]
    fn retrieve_rejects_foreign_object() {
        let client = client(&[r#"{"object":"customer","id":"cust_1"}"#]);
        let err = client.cards("cust_1").retrieve("card_1").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Decode);
    }
}
