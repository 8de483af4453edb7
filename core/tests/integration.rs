//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the resource
//! bindings over real HTTP through `UreqTransport`. Validates that request
//! building, transport and response mapping agree with an actual server.

use std::net::SocketAddr;

use omise_core::{
    CardParams, ChargeStatus, ClientConfig, CreateCharge, CreateCustomer, CreateToken, ErrorKind,
    ListParams, OmiseClient, Params, UpdateCustomer, UreqTransport,
};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr, secret_key: &str) -> OmiseClient<UreqTransport> {
    let config = ClientConfig::new(secret_key)
        .with_public_key("pkey_test_1")
        .with_base(&format!("http://{addr}"));
    OmiseClient::new(config, UreqTransport::new())
}

fn test_card() -> CreateToken {
    CreateToken {
        card: CardParams {
            name: "Somchai Prasert".to_string(),
            number: "4242424242424242".to_string(),
            expiration_month: 10,
            expiration_year: 2030,
            security_code: Some("123".to_string()),
            ..CardParams::default()
        },
    }
}

#[test]
fn customer_lifecycle() {
    let client = client_for(start_server(), "skey_test_1");

    // Step 1: list is empty.
    let customers = client.customers().list(&ListParams::new()).unwrap();
    assert!(customers.is_empty());
    assert_eq!(customers.total, 0);

    // Step 2: tokenize a card on the vault host.
    let token = client.tokens().create(&test_card()).unwrap();
    assert!(token.id.starts_with("tokn_"));
    assert!(!token.used);
    assert_eq!(token.card.as_ref().unwrap().last_digits, "4242");

    // Step 3: create a customer holding the card.
    let created = client
        .customers()
        .create(&CreateCustomer {
            email: Some("john.doe@example.com".to_string()),
            description: Some("John Doe (id: 30)".to_string()),
            card: Some(token.id.clone()),
            ..CreateCustomer::default()
        })
        .unwrap();
    assert_eq!(created.email, "john.doe@example.com");
    assert_eq!(created.description, "John Doe (id: 30)");
    let cards = created.cards.as_ref().unwrap();
    assert_eq!(cards.total, 1);
    assert_eq!(created.default_card.as_deref(), Some(cards.data[0].id.as_str()));

    // Step 4: the token is now marked used.
    assert!(client.tokens().retrieve(&token.id).unwrap().used);

    // Step 5: retrieve matches create.
    let fetched = client.customers().retrieve(&created.id).unwrap();
    assert_eq!(fetched, created);

    // Step 6: update with typed params, then with passthrough metadata.
    let updated = client
        .customers()
        .update(
            &created.id,
            &UpdateCustomer {
                description: Some("updated".to_string()),
                ..UpdateCustomer::default()
            },
        )
        .unwrap();
    assert_eq!(updated.description, "updated");
    assert_eq!(updated.email, "john.doe@example.com");

    let updated = client
        .customers()
        .update(
            &created.id,
            &Params::new().with("metadata", Params::new().with("plan", "gold")),
        )
        .unwrap();
    assert_eq!(updated.metadata["plan"], "gold");

    // Step 7: the nested card list.
    let cards = client.cards(&created.id).list(&ListParams::new()).unwrap();
    assert_eq!(cards.len(), 1);

    // Step 8: destroy, then retrieve is not_found.
    let deleted = client.customers().destroy(&created.id).unwrap();
    assert!(deleted.deleted);
    assert_eq!(deleted.id, created.id);

    let err = client.customers().retrieve(&created.id).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.kind, ErrorKind::Api);
    assert_eq!(err.status, Some(404));
    assert_eq!(
        err.location.as_deref(),
        Some("https://www.omise.co/api-errors#not-found")
    );
}

#[test]
fn list_pagination() {
    let client = client_for(start_server(), "skey_test_1");
    for i in 0..5 {
        client
            .customers()
            .create(&Params::new().with("email", format!("user{i}@example.com")))
            .unwrap();
    }

    let first = client.customers().list(&ListParams::new().limit(2)).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first.total, 5);
    assert!(first.has_more());

    let mut seen = first.iter().map(|c| c.email.clone()).collect::<Vec<_>>();
    let mut next = first.next_page();
    while let Some(params) = next {
        let page = client.customers().list(&params).unwrap();
        seen.extend(page.iter().map(|c| c.email.clone()));
        next = page.next_page();
    }
    assert_eq!(
        seen,
        (0..5).map(|i| format!("user{i}@example.com")).collect::<Vec<_>>()
    );
}

#[test]
fn charge_authorize_and_capture() {
    let client = client_for(start_server(), "skey_test_1");
    let token = client.tokens().create(&test_card()).unwrap();

    let charge = client
        .charges()
        .create(&CreateCharge {
            amount: 100_000,
            currency: "thb".to_string(),
            card: Some(token.id),
            capture: Some(false),
            ..CreateCharge::default()
        })
        .unwrap();
    assert_eq!(charge.status, Some(ChargeStatus::Pending));
    assert!(charge.authorized);
    assert!(!charge.paid);

    let captured = client.charges().capture(&charge.id).unwrap();
    assert_eq!(captured.status, Some(ChargeStatus::Successful));
    assert!(captured.paid);

    // capturing twice is an API error, not a decode failure
    let err = client.charges().capture(&charge.id).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Api);
    assert_eq!(err.code, "failed_capture");

    let balance = client.balance().retrieve().unwrap();
    assert_eq!(balance.available, 100_000);
}

#[test]
fn wrong_key_is_authentication_failure() {
    let client = client_for(start_server(), "not_a_key");
    let err = client.customers().list(&ListParams::new()).unwrap_err();
    assert!(err.is_authentication_failure());
    assert_eq!(err.status, Some(401));
}

#[test]
fn validation_error_carries_code() {
    let client = client_for(start_server(), "skey_test_1");
    let err = client
        .charges()
        .create(&Params::new().with("currency", "thb"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Api);
    assert_eq!(err.code, "invalid_charge");
    assert_eq!(err.status, Some(400));
}

#[test]
fn unreachable_host_is_transport_error() {
    // bind then drop to get a port nothing listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = client_for(addr, "skey_test_1");
    let err = client.balance().retrieve().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Transport);
    assert_eq!(err.status, None);
}

#[test]
fn concurrent_calls_share_one_client() {
    let client = client_for(start_server(), "skey_test_1");

    std::thread::scope(|scope| {
        for t in 0..4 {
            let client = &client;
            scope.spawn(move || {
                for i in 0..5 {
                    let email = format!("t{t}-{i}@example.com");
                    let customer = client
                        .customers()
                        .create(&Params::new().with("email", email.as_str()))
                        .unwrap();
                    assert_eq!(customer.email, email);
                    let fetched = client.customers().retrieve(&customer.id).unwrap();
                    assert_eq!(fetched.id, customer.id);
                }
            });
        }
    });

    let all = client.customers().list(&ListParams::new().limit(100)).unwrap();
    assert_eq!(all.total, 20);
}
