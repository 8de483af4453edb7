//! Request builder.
//!
//! # Design
//! `RequestBuilder` turns a method, a resource-relative path and a
//! `RequestOptions` bundle into a fully specified `HttpRequest`. It performs
//! no I/O and holds nothing but the client configuration, so the same input
//! always yields the same request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Error;
use crate::http::{HttpMethod, HttpRequest};
use crate::params::{EncodingError, Params};
use crate::shape::{json_type, ListOf, Single};

pub const API_VERSION_HEADER: &str = "Omise-Version";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Which API host serves an endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Host {
    /// The main API, authenticated with the secret key.
    #[default]
    Api,
    /// The card vault, authenticated with the public key.
    Vault,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Form(Params),
    Json(Value),
}

/// Everything a call needs besides method and path.
///
/// `shape` is the target shape descriptor; the builder never looks at it.
#[derive(Debug, Clone)]
pub struct RequestOptions<S> {
    pub query: Params,
    pub body: RequestBody,
    pub host: Host,
    pub shape: S,
}

impl<S> RequestOptions<S> {
    pub fn new(shape: S) -> Self {
        Self {
            query: Params::new(),
            body: RequestBody::Empty,
            host: Host::Api,
            shape,
        }
    }

    pub fn with_query(mut self, query: Params) -> Self {
        self.query = query;
        self
    }

    pub fn with_form(mut self, params: Params) -> Self {
        self.body = RequestBody::Form(params);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn on_vault(mut self) -> Self {
        self.host = Host::Vault;
        self
    }

    /// Form-encode any serializable parameter set as the body.
    pub fn form<P: Serialize + ?Sized>(self, params: &P) -> Result<Self, EncodingError> {
        Ok(self.with_form(Params::from_serialize(params)?))
    }

    /// Use any serializable parameter set as the GET query.
    pub fn query<P: Serialize + ?Sized>(self, params: &P) -> Result<Self, EncodingError> {
        Ok(self.with_query(Params::from_serialize(params)?))
    }
}

impl<T> RequestOptions<Single<T>> {
    pub fn entity() -> Self {
        Self::new(Single::new())
    }
}

impl<T> RequestOptions<ListOf<T>> {
    pub fn list() -> Self {
        Self::new(ListOf::new())
    }
}

/// Builds authenticated requests from the client configuration.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    config: ClientConfig,
}

impl RequestBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn build<S>(
        &self,
        method: HttpMethod,
        path: &str,
        options: &RequestOptions<S>,
    ) -> Result<HttpRequest, Error> {
        let mut url = self.url(options.host, path);

        if method.uses_query() {
            let query = options.query.encode()?;
            if !query.is_empty() {
                url.push('?');
                url.push_str(&query);
            }
            if options.body != RequestBody::Empty {
                debug!(%method, path, "ignoring request body on a query-only method");
            }
        } else if !options.query.is_empty() {
            debug!(%method, path, "ignoring query parameters on a body method");
        }

        let mut headers = vec![
            ("Authorization".to_string(), self.authorization(options.host)),
            (API_VERSION_HEADER.to_string(), self.config.api_version.clone()),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
            ("Accept".to_string(), JSON_CONTENT_TYPE.to_string()),
        ];

        let body = match &options.body {
            _ if method.uses_query() => None,
            RequestBody::Empty => None,
            RequestBody::Form(params) => {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                Some(params.encode()?)
            }
            RequestBody::Json(value) => {
                if !value.is_object() {
                    return Err(EncodingError::NotAnObject(json_type(value)).into());
                }
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
                Some(value.to_string())
            }
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    fn url(&self, host: Host, path: &str) -> String {
        let base = match host {
            Host::Api => &self.config.api_base,
            Host::Vault => &self.config.vault_base,
        };
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    /// Basic auth with the key as username and an empty password.
    fn authorization(&self, host: Host) -> String {
        let key = match host {
            Host::Vault => self
                .config
                .public_key
                .as_deref()
                .unwrap_or(self.config.secret_key.as_str()),
            Host::Api => self.config.secret_key.as_str(),
        };
        format!("Basic {}", STANDARD.encode(format!("{key}:")))
    }
}
