use serde::Serialize;

use super::{entity, segment};
use crate::client::OmiseClient;
use crate::error::Result;
use crate::http::{HttpMethod, Transport};
use crate::types::Token;

/// Card tokens, served by the vault host.
pub struct Tokens<'a, T> {
    client: &'a OmiseClient<T>,
}

impl<'a, T: Transport> Tokens<'a, T> {
    pub(crate) fn new(client: &'a OmiseClient<T>) -> Self {
        Self { client }
    }

    pub fn create<P: Serialize + ?Sized>(&self, params: &P) -> Result<Token> {
        self.client.execute(
            HttpMethod::Post,
            "tokens",
            entity::<Token>().on_vault().form(params)?,
        )
    }

    pub fn retrieve(&self, id: &str) -> Result<Token> {
        self.client.execute(
            HttpMethod::Get,
            &format!("tokens/{}", segment(id)),
            entity::<Token>().on_vault(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::resources::testing::client;
    use crate::types::{CardParams, CreateToken};

    #[test]
    fn create_goes_to_vault_with_public_key() {
        let client = client(&[
            r#"{"object":"token","id":"tokn_1","used":false,"card":{"object":"card","id":"card_1","last_digits":"4242"}}"#,
        ]);
        let input = CreateToken {
            card: CardParams {
                name: "Somchai Prasert".into(),
                number: "4242424242424242".into(),
                expiration_month: 10,
                expiration_year: 2030,
                security_code: Some("123".into()),
                ..CardParams::default()
            },
        };
        let token = client.tokens().create(&input).unwrap();
        assert_eq!(token.id, "tokn_1");
        assert_eq!(token.card.unwrap().last_digits, "4242");

        let req = client.transport().last();
        assert_eq!(req.url, "https://vault.test/tokens");
        // base64("pkey_test_1:")
        assert_eq!(req.header("authorization"), Some("Basic cGtleV90ZXN0XzE6"));
        assert_eq!(
            req.body.as_deref(),
            Some(
                "card[name]=Somchai%20Prasert&card[number]=4242424242424242\
                 &card[expiration_month]=10&card[expiration_year]=2030&card[security_code]=123"
            )
        );
    }

    #[test]
    fn retrieve_reads_from_vault() {
        let client = client(&[r#"{"object":"token","id":"tokn_1","used":true}"#]);
        let token = client.tokens().retrieve("tokn_1").unwrap();
        assert!(token.used);
        assert_eq!(client.transport().last().url, "https://vault.test/tokens/tokn_1");
    }
}
