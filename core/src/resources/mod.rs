//! Per-resource endpoint bindings.
//!
//! Each accessor borrows the client and maps one operation to one
//! `execute` call: method, path, parameters and target shape. Parameters are
//! any `Serialize` value, so keys the typed structs do not know about can be
//! passed through with `Params` or a JSON map.

mod balance;
mod cards;
mod charges;
mod customers;
mod refunds;
mod tokens;

use std::borrow::Cow;

pub use balance::Balances;
pub use cards::Cards;
pub use charges::Charges;
pub use customers::Customers;
pub use refunds::Refunds;
pub use tokens::Tokens;

use crate::request::RequestOptions;
use crate::shape::{Entity, ListOf, Single};

fn entity<E: Entity>() -> RequestOptions<Single<E>> {
    RequestOptions::entity()
}

fn list<E: Entity>() -> RequestOptions<ListOf<E>> {
    RequestOptions::list()
}

/// Percent-encode an identifier for use as a path segment.
fn segment(id: &str) -> Cow<'_, str> {
    urlencoding::encode(id)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::config::ClientConfig;
    use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};
    use crate::OmiseClient;

    /// Answers with queued bodies (status 200) and records each request.
    #[derive(Default)]
    pub(crate) struct Recorder {
        replies: Mutex<VecDeque<String>>,
        pub(crate) requests: Mutex<Vec<HttpRequest>>,
    }

    impl Recorder {
        pub(crate) fn replying(bodies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(bodies.iter().map(|b| b.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn last(&self) -> HttpRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for Recorder {
        fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            let body = self.replies.lock().unwrap().pop_front().unwrap_or_default();
            Ok(HttpResponse {
                status: 200,
                headers: Vec::new(),
                body,
            })
        }
    }

    pub(crate) fn client(bodies: &[&str]) -> OmiseClient<Recorder> {
        OmiseClient::new(
            ClientConfig::new("skey_test_1")
                .with_public_key("pkey_test_1")
                .with_api_base("https://api.test")
                .with_vault_base("https://vault.test"),
            Recorder::replying(bodies),
        )
    }

    pub(crate) const EMPTY_LIST: &str =
        r#"{"object":"list","data":[],"total":0,"offset":0,"limit":20}"#;
}
