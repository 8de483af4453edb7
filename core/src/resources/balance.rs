use super::entity;
use crate::client::OmiseClient;
use crate::error::Result;
use crate::http::{HttpMethod, Transport};
use crate::types::Balance;

pub struct Balances<'a, T> {
    client: &'a OmiseClient<T>,
}

impl<'a, T: Transport> Balances<'a, T> {
    pub(crate) fn new(client: &'a OmiseClient<T>) -> Self {
        Self { client }
    }

    pub fn retrieve(&self) -> Result<Balance> {
        self.client
            .execute(HttpMethod::Get, "balance", entity::<Balance>())
    }
}
