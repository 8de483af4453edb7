use serde::Serialize;

use super::{entity, list, segment};
use crate::client::OmiseClient;
use crate::error::Result;
use crate::http::{HttpMethod, Transport};
use crate::list::List;
use crate::types::Charge;

pub struct Charges<'a, T> {
    client: &'a OmiseClient<T>,
}

impl<'a, T: Transport> Charges<'a, T> {
    pub(crate) fn new(client: &'a OmiseClient<T>) -> Self {
        Self { client }
    }

    pub fn list<P: Serialize + ?Sized>(&self, params: &P) -> Result<List<Charge>> {
        self.client
            .execute(HttpMethod::Get, "charges", list::<Charge>().query(params)?)
    }

    pub fn retrieve(&self, id: &str) -> Result<Charge> {
        self.client.execute(
            HttpMethod::Get,
            &format!("charges/{}", segment(id)),
            entity::<Charge>(),
        )
    }

    pub fn create<P: Serialize + ?Sized>(&self, params: &P) -> Result<Charge> {
        self.client
            .execute(HttpMethod::Post, "charges", entity::<Charge>().form(params)?)
    }

    pub fn update<P: Serialize + ?Sized>(&self, id: &str, params: &P) -> Result<Charge> {
        self.client.execute(
            HttpMethod::Patch,
            &format!("charges/{}", segment(id)),
            entity::<Charge>().form(params)?,
        )
    }

    /// Capture a charge created with `capture=false`.
    pub fn capture(&self, id: &str) -> Result<Charge> {
        self.client.execute(
            HttpMethod::Post,
            &format!("charges/{}/capture", segment(id)),
            entity::<Charge>(),
        )
    }

    /// Release an authorized, uncaptured charge.
    pub fn reverse(&self, id: &str) -> Result<Charge> {
        self.client.execute(
            HttpMethod::Post,
            &format!("charges/{}/reverse", segment(id)),
            entity::<Charge>(),
        )
    }
}
