use serde::Serialize;

use super::{entity, list, segment};
use crate::client::OmiseClient;
use crate::error::Result;
use crate::http::{HttpMethod, Transport};
use crate::list::List;
use crate::types::Customer;

pub struct Customers<'a, T> {
    client: &'a OmiseClient<T>,
}

impl<'a, T: Transport> Customers<'a, T> {
    pub(crate) fn new(client: &'a OmiseClient<T>) -> Self {
        Self { client }
    }

    pub fn list<P: Serialize + ?Sized>(&self, params: &P) -> Result<List<Customer>> {
        self.client
            .execute(HttpMethod::Get, "customers", list::<Customer>().query(params)?)
    }

    pub fn retrieve(&self, id: &str) -> Result<Customer> {
        self.client.execute(
            HttpMethod::Get,
            &format!("customers/{}", segment(id)),
            entity::<Customer>(),
        )
    }

    pub fn create<P: Serialize + ?Sized>(&self, params: &P) -> Result<Customer> {
        self.client
            .execute(HttpMethod::Post, "customers", entity::<Customer>().form(params)?)
    }

    pub fn update<P: Serialize + ?Sized>(&self, id: &str, params: &P) -> Result<Customer> {
        self.client.execute(
            HttpMethod::Patch,
            &format!("customers/{}", segment(id)),
            entity::<Customer>().form(params)?,
        )
    }

    /// The returned snapshot has `deleted` set.
    pub fn destroy(&self, id: &str) -> Result<Customer> {
        self.client.execute(
            HttpMethod::Delete,
            &format!("customers/{}", segment(id)),
            entity::<Customer>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::http::HttpMethod;
    use crate::list::ListParams;
    use crate::params::Params;
    use crate::resources::testing::{client, EMPTY_LIST};
    use crate::types::{CreateCustomer, UpdateCustomer};

    const CUSTOMER: &str = r#"{"object":"customer","id":"cust_1","email":"a@b.com"}"#;

    #[test]
    fn list_sends_window_as_query() {
        let client = client(&[EMPTY_LIST]);
        let list = client
            .customers()
            .list(&ListParams::new().offset(20).limit(10))
            .unwrap();
        assert!(list.is_empty());

        let req = client.transport().last();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.test/customers?offset=20&limit=10");
    }

    #[test]
    fn retrieve_escapes_the_id() {
        let client = client(&[CUSTOMER]);
        client.customers().retrieve("cust 1/x").unwrap();
        assert_eq!(client.transport().last().url, "https://api.test/customers/cust%201%2Fx");
    }

    #[test]
    fn create_posts_form() {
        let client = client(&[CUSTOMER]);
        let input = CreateCustomer {
            email: Some("a@b.com".into()),
            description: Some("John Doe".into()),
            ..CreateCustomer::default()
        };
        let customer = client.customers().create(&input).unwrap();
        assert_eq!(customer.id, "cust_1");

        let req = client.transport().last();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://api.test/customers");
        assert_eq!(req.body.as_deref(), Some("email=a%40b.com&description=John%20Doe"));
    }

    #[test]
    fn update_passes_unknown_keys_through() {
        let client = client(&[CUSTOMER]);
        let params = Params::new().with("description", "VIP").with("linked_account", "acct_9");
        client.customers().update("cust_1", &params).unwrap();

        let req = client.transport().last();
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(req.url, "https://api.test/customers/cust_1");
        assert_eq!(req.body.as_deref(), Some("description=VIP&linked_account=acct_9"));
    }

    #[test]
    fn update_with_typed_params() {
        let client = client(&[CUSTOMER]);
        let input = UpdateCustomer {
            default_card: Some("card_2".into()),
            ..UpdateCustomer::default()
        };
        client.customers().update("cust_1", &input).unwrap();
        assert_eq!(client.transport().last().body.as_deref(), Some("default_card=card_2"));
    }

    #[test]
    fn destroy_returns_deleted_snapshot() {
        let client = client(&[r#"{"object":"customer","id":"cust_1","deleted":true}"#]);
        let customer = client.customers().destroy("cust_1").unwrap();
        assert!(customer.deleted);
        assert_eq!(client.transport().last().method, HttpMethod::Delete);
    }
}
