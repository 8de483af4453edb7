use serde::Serialize;

use super::{entity, list, segment};
use crate::client::OmiseClient;
use crate::error::Result;
use crate::http::{HttpMethod, Transport};
use crate::list::List;
use crate::types::Refund;

/// Refunds of one charge.
pub struct Refunds<'a, T> {
    client: &'a OmiseClient<T>,
    charge_id: &'a str,
}

impl<'a, T: Transport> Refunds<'a, T> {
    pub(crate) fn new(client: &'a OmiseClient<T>, charge_id: &'a str) -> Self {
        Self { client, charge_id }
    }

    fn path(&self) -> String {
        format!("charges/{}/refunds", segment(self.charge_id))
    }

    pub fn list<P: Serialize + ?Sized>(&self, params: &P) -> Result<List<Refund>> {
        self.client
            .execute(HttpMethod::Get, &self.path(), list::<Refund>().query(params)?)
    }

    pub fn retrieve(&self, refund_id: &str) -> Result<Refund> {
        self.client.execute(
            HttpMethod::Get,
            &format!("{}/{}", self.path(), segment(refund_id)),
            entity::<Refund>(),
        )
    }

    pub fn create<P: Serialize + ?Sized>(&self, params: &P) -> Result<Refund> {
        self.client
            .execute(HttpMethod::Post, &self.path(), entity::<Refund>().form(params)?)
    }
}
