//! End-to-end secret reads through the bearer challenge flow against a mock vault.

#![allow(clippy::unwrap_used, clippy::panic)]

use ignite_keyvault::{
    Credential, KeyVaultClient, KeyVaultError, KeyVaultRepository, ManagedIdentityCredential,
};
use serde_json::json;
use wiremock::matchers::{bearer_token, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_challenge(server: &MockServer) {
    mount_challenge_for(server, &server.uri()).await;
}

async fn mount_challenge_for(server: &MockServer, resource: &str) {
    let challenge = format!(
        r#"Bearer authorization="{}/tenant-id", resource="{resource}""#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("WWW-Authenticate", challenge.as_str())
                .set_body_json(json!({"error": {"code": "Unauthorized", "message": "AKV10000: Request is missing a Bearer or PoP token."}})),
        )
        .with_priority(10)
        .mount(server)
        .await;
}

async fn mount_msi(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/msi/token"))
        .and(query_param("resource", server.uri().as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"access_token": "msi-token"})))
        .mount(server)
        .await;
}

fn repository(server: &MockServer) -> KeyVaultRepository {
    let endpoint = format!("{}/msi/token", server.uri());
    let http = reqwest::Client::new();
    let msi = ManagedIdentityCredential::new(None, http.clone()).with_env_lookup(move |key| {
        match key {
            "MSI_ENDPOINT" => Some(endpoint.clone()),
            "MSI_SECRET" => Some("shared-secret".to_owned()),
            _ => None,
        }
    });
    KeyVaultRepository::new(
        KeyVaultClient::new(Credential::ManagedIdentity(msi), http),
        server.uri(),
    )
    .unwrap()
}

#[tokio::test]
async fn answers_challenge_then_reads_secret() {
    let server = MockServer::start().await;
    mount_challenge(&server).await;
    mount_msi(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .and(query_param("api-version", "7.4"))
        .and(bearer_token("msi-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": "X",
            "id": format!("{}/secrets/db-password/0123", server.uri()),
            "attributes": {"enabled": true, "created": 1_700_000_000, "updated": 1_700_000_000}
        })))
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;

    let repo = repository(&server);
    assert_eq!(repo.get("db-password").await.unwrap(), "X");

    let bundle = repo.get_secret_bundle("db-password").await.unwrap().unwrap();
    assert_eq!(bundle.value, "X");
    assert!(bundle.id.unwrap().ends_with("/secrets/db-password/0123"));
}

#[tokio::test]
async fn missing_secret_reads_as_empty_string() {
    let server = MockServer::start().await;
    mount_challenge(&server).await;
    mount_msi(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .and(bearer_token("msi-token"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": "SecretNotFound", "message": "A secret with (name/id) db-password was not found in this key vault."}
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    let repo = repository(&server);
    assert_eq!(repo.get("db-password").await.unwrap(), "");
    assert!(repo.get_secret_bundle("db-password").await.unwrap().is_none());
}

#[tokio::test]
async fn forbidden_propagates_with_vault_detail() {
    let server = MockServer::start().await;
    mount_challenge(&server).await;
    mount_msi(&server, 200).await;
    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .and(bearer_token("msi-token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": "Forbidden", "message": "The user, group or application does not have secrets get permission."}
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    let err = repository(&server).get("db-password").await.unwrap_err();
    match err {
        KeyVaultError::Vault { status, code, message } => {
            assert_eq!(status, 403);
            assert_eq!(code.as_deref(), Some("Forbidden"));
            assert!(message.contains("secrets get permission"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn soft_msi_failure_surfaces_as_vault_rejection() {
    let server = MockServer::start().await;
    mount_challenge(&server).await;
    mount_msi(&server, 400).await;

    let err = repository(&server).get("db-password").await.unwrap_err();
    assert!(matches!(err, KeyVaultError::Vault { status: 401, .. }));
}

#[tokio::test]
async fn unauthorized_without_challenge_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = repository(&server).get("db-password").await.unwrap_err();
    assert!(matches!(err, KeyVaultError::Challenge(_)));
}

#[tokio::test]
async fn challenge_for_another_resource_is_refused() {
    let server = MockServer::start().await;
    mount_challenge_for(&server, "https://attacker.example").await;
    Mock::given(method("GET"))
        .and(path("/msi/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "msi-token"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = repository(&server).get("db-password").await.unwrap_err();
    assert!(matches!(err, KeyVaultError::Challenge(_)));
}
