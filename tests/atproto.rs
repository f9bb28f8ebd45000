mod common;

use statusphere::atproto::{AtpClient, ClientError};
use statusphere::config::AtprotoConfig;

use common::{spawn_pds, ALICE_DID, APP_PASSWORD, BOB_DID};

fn client(host: &str) -> AtpClient {
    AtpClient::new(&AtprotoConfig {
        pds_host: host.to_owned(),
    })
    .expect("client")
}

#[test]
fn empty_host_is_rejected() {
    let err = AtpClient::new(&AtprotoConfig {
        pds_host: String::new(),
    })
    .unwrap_err();
    assert!(matches!(err, ClientError::MissingHost));
}

#[test]
fn trailing_slash_is_trimmed() {
    assert_eq!(client("https://pds.example/").host(), "https://pds.example");
}

#[tokio::test]
async fn missing_credentials_never_reach_the_server() {
    // Nothing listens here; a request would fail with a transport error.
    let client = client("http://127.0.0.1:1");
    assert!(matches!(
        client.login("", APP_PASSWORD).await,
        Err(ClientError::MissingCredentials)
    ));
    assert!(matches!(
        client.login("alice.test", "").await,
        Err(ClientError::MissingCredentials)
    ));
}

#[tokio::test]
async fn profile_requires_login() {
    let pds = spawn_pds().await;
    let client = client(&pds.url);
    assert!(matches!(
        client.get_profile(ALICE_DID).await,
        Err(ClientError::Unauthenticated)
    ));
}

#[tokio::test]
async fn login_then_profile() {
    let pds = spawn_pds().await;
    let client = client(&pds.url);

    let auth = client.login("alice.test", APP_PASSWORD).await.expect("login");
    assert_eq!(auth.did, ALICE_DID);
    assert_eq!(auth.handle, "alice.test");
    assert_eq!(auth.access_jwt, "access-alice.test");
    assert!(client.is_logged_in().await);

    let profile = client.get_profile(&auth.did).await.expect("profile");
    assert_eq!(profile.display_name.as_deref(), Some("Alice"));
    assert_eq!(profile.followers_count, 3);
    assert_eq!(profile.follows_count, 5);

    let bob = client.get_profile(BOB_DID).await.expect("bob");
    assert_eq!(bob.display_name, None);
    assert_eq!(bob.followers_count, 0);
}

#[tokio::test]
async fn wrong_password_is_rejected_with_server_message() {
    let pds = spawn_pds().await;
    let client = client(&pds.url);

    match client.login("alice.test", "nope").await {
        Err(ClientError::Rejected(message)) => {
            assert_eq!(message, "Invalid identifier or password")
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(!client.is_logged_in().await);
}

#[tokio::test]
async fn unknown_profile_is_not_found() {
    let pds = spawn_pds().await;
    let client = client(&pds.url);
    client.login("bob.test", APP_PASSWORD).await.expect("login");

    assert!(matches!(
        client.get_profile("did:plc:ghost").await,
        Err(ClientError::NotFound(actor)) if actor == "did:plc:ghost"
    ));
}

#[tokio::test]
async fn server_failure_is_remote_error() {
    let pds = spawn_pds().await;
    let client = client(&pds.url);
    assert!(matches!(
        client.login("broken.test", APP_PASSWORD).await,
        Err(ClientError::Remote(_))
    ));
}

#[tokio::test]
async fn fresh_client_starts_logged_out() {
    let pds = spawn_pds().await;
    let client = client(&pds.url);
    client.login("alice.test", APP_PASSWORD).await.expect("login");

    let fresh = client.fresh();
    assert!(!fresh.is_logged_in().await);
    assert_eq!(fresh.host(), client.host());
    assert!(client.is_logged_in().await);
}
