//! Dispatch: build, send, map.
//!
//! # Design
//! `OmiseClient` pairs the pure `RequestBuilder` with a `Transport`. Each
//! `execute` call is one blocking exchange with one outcome; there is no
//! retry, cache or shared mutable state, so a client can be used from many
//! threads at once when its transport allows it.

use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::mapper;
use crate::request::{RequestBuilder, RequestOptions};
use crate::resources::{Balances, Cards, Charges, Customers, Refunds, Tokens};
use crate::shape::TargetShape;

#[derive(Debug, Clone)]
pub struct OmiseClient<T> {
    builder: RequestBuilder,
    transport: T,
}

#[cfg(feature = "ureq")]
impl OmiseClient<crate::transport::UreqTransport> {
    /// Client over the default blocking transport.
    pub fn with_default_transport(config: ClientConfig) -> Self {
        Self::new(config, crate::transport::UreqTransport::new())
    }
}

impl<T: Transport> OmiseClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            builder: RequestBuilder::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.builder.config()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request without sending it.
    pub fn build<S>(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions<S>,
    ) -> Result<HttpRequest, Error> {
        self.builder.build(method, path, options)
    }

    /// Map a response obtained elsewhere.
    pub fn parse<S: TargetShape>(&self, response: &HttpResponse, shape: &S) -> Result<S::Output, Error> {
        mapper::map(response, shape)
    }

    /// Build the request, send it, and map the response into `S::Output`.
    ///
    /// A transport failure is returned as-is without consulting the mapper.
    pub fn execute<S: TargetShape>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions<S>,
    ) -> Result<S::Output, Error> {
        let request = self.builder.build(method, path, &options)?;
        debug!(%method, url = %request.url, "sending request");

        let response = self.transport.send(&request).map_err(|err| {
            warn!(%method, url = %request.url, error = %err, kind = ?err.kind, "transport failure");
            Error::from(err)
        })?;

        if (200..300).contains(&response.status) {
            debug!(%method, url = %request.url, status = response.status, "received response");
        } else {
            warn!(%method, url = %request.url, status = response.status, "API returned an error status");
        }
        mapper::map(&response, &options.shape)
    }

    pub fn customers(&self) -> Customers<'_, T> {
        Customers::new(self)
    }

    pub fn cards<'a>(&'a self, customer_id: &'a str) -> Cards<'a, T> {
        Cards::new(self, customer_id)
    }

    pub fn charges(&self) -> Charges<'_, T> {
        Charges::new(self)
    }

    pub fn refunds<'a>(&'a self, charge_id: &'a str) -> Refunds<'a, T> {
        Refunds::new(self, charge_id)
    }

    pub fn tokens(&self) -> Tokens<'_, T> {
        Tokens::new(self)
    }

    pub fn balance(&self) -> Balances<'_, T> {
        Balances::new(self)
    }
}
