//! Synchronous client core for the Omise payment API.
//!
//! # Overview
//! Every API call goes through the same three steps: the [`RequestBuilder`]
//! turns a method, path and [`RequestOptions`] into a plain [`HttpRequest`],
//! a [`Transport`] performs the round-trip, and the response mapper turns the
//! [`HttpResponse`] into either the requested shape or one [`Error`].
//!
//! # Design
//! - Building and mapping are pure. `OmiseClient::build` and
//!   `OmiseClient::parse` expose them separately so a host can do the IO
//!   itself; `OmiseClient::execute` runs all three steps.
//! - The expected result is described by a zero-sized shape value
//!   ([`Single`] or [`ListOf`]) instead of a runtime type token.
//! - All failures collapse into [`Error`], tagged with an [`ErrorKind`].
//! - Entities are decoded independently from the mock-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod list;
pub mod mapper;
pub mod params;
pub mod request;
pub mod resources;
pub mod shape;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;

pub use client::OmiseClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{Error, ErrorKind, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, TransportErrorKind};
pub use list::{List, ListParams, SortOrder};
pub use params::{EncodingError, ParamValue, Params};
pub use request::{Host, RequestBody, RequestBuilder, RequestOptions};
pub use shape::{Entity, ListOf, ShapeError, ShapeKind, Single, TargetShape};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    Balance, Card, CardParams, Charge, ChargeStatus, CreateCharge, CreateCustomer, CreateRefund,
    CreateToken, Customer, Metadata, Refund, Token, UpdateCard, UpdateCharge, UpdateCustomer,
};
