//! Client configuration.
//!
//! Built once at startup and handed to `OmiseClient::new`; nothing in the
//! crate reads credentials or endpoints from ambient state on its own.

use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.omise.co";
pub const DEFAULT_VAULT_BASE: &str = "https://vault.omise.co";
pub const DEFAULT_API_VERSION: &str = "2019-05-29";

const ENV_SECRET_KEY: &str = "OMISE_SECRET_KEY";
const ENV_PUBLIC_KEY: &str = "OMISE_PUBLIC_KEY";
const ENV_API_BASE: &str = "OMISE_API_BASE";
const ENV_VAULT_BASE: &str = "OMISE_VAULT_BASE";
const ENV_API_VERSION: &str = "OMISE_API_VERSION";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
}

/// Credentials, endpoints and the pinned API version.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub secret_key: String,
    /// Used for the vault host (card tokenization). Falls back to the secret
    /// key when unset.
    pub public_key: Option<String>,
    pub api_base: String,
    pub vault_base: String,
    pub api_version: String,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            public_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            vault_base: DEFAULT_VAULT_BASE.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: format!("omise-core-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = trim_base(base);
        self
    }

    pub fn with_vault_base(mut self, base: &str) -> Self {
        self.vault_base = trim_base(base);
        self
    }

    /// Point both hosts at the same base URL, as a local stub server does.
    pub fn with_base(self, base: &str) -> Self {
        self.with_api_base(base).with_vault_base(base)
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Read `OMISE_SECRET_KEY` (required), `OMISE_PUBLIC_KEY`,
    /// `OMISE_API_BASE`, `OMISE_VAULT_BASE` and `OMISE_API_VERSION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] over an arbitrary variable source.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let secret_key = get(ENV_SECRET_KEY).ok_or(ConfigError::Missing(ENV_SECRET_KEY))?;
        let mut config = Self::new(secret_key);
        if let Some(public_key) = get(ENV_PUBLIC_KEY) {
            config = config.with_public_key(public_key);
        }
        if let Some(base) = get(ENV_API_BASE) {
            config = config.with_api_base(&base);
        }
        if let Some(base) = get(ENV_VAULT_BASE) {
            config = config.with_vault_base(&base);
        }
        if let Some(version) = get(ENV_API_VERSION) {
            config = config.with_api_version(version);
        }
        Ok(config)
    }
}

// Keys stay out of logs and panic messages.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("secret_key", &"<redacted>")
            .field("public_key", &self.public_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("vault_base", &self.vault_base)
            .field("api_version", &self.api_version)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}
