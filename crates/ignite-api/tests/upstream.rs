//! `UpstreamUxoService` against a mock upstream.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use ignite_api::models::Uxo;
use ignite_api::services::{ServiceError, UpstreamUxoService, UxoDocumentService, UxoService};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer, key: Option<&str>) -> UpstreamUxoService {
    UpstreamUxoService::new(
        format!("{}/", server.uri()),
        Duration::from_secs(5),
        key.map(str::to_owned),
    )
    .unwrap()
}

#[tokio::test]
async fn lists_display_items_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uxos"))
        .and(header("x-api-key", "k-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "latitude": 0.0, "longitude": 0.0, "symbol": "2525C"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let items = service(&server, Some("k-123")).uxos_for_display().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].symbol, "2525C");
}

#[tokio::test]
async fn missing_record_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uxos/404-id"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(service(&server, None).fetch_uxo("404-id").await.unwrap().is_none());
}

#[tokio::test]
async fn fetches_record_with_extra_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uxos/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1", "depthCm": 35})))
        .mount(&server)
        .await;

    let uxo = service(&server, None).fetch_uxo("1").await.unwrap().unwrap();
    assert_eq!(uxo.id, "1");
    assert_eq!(uxo.fields["depthCm"], json!(35));
}

#[tokio::test]
async fn upstream_errors_carry_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uxos"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&server)
        .await;

    let err = service(&server, None).uxos_for_display().await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Status { status: 503, ref message } if message == "maintenance"
    ));
}

#[tokio::test]
async fn posts_record_and_returns_document_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uxos/1/documents"))
        .and(body_json(json!({"id": "1"})))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Some text".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = service(&server, None)
        .create_document(&Uxo::new("1"))
        .await
        .unwrap();
    assert_eq!(bytes.as_deref(), Some(&b"Some text"[..]));
}

#[tokio::test]
async fn empty_document_body_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/uxos/1/documents"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let bytes = service(&server, None)
        .create_document(&Uxo::new("1"))
        .await
        .unwrap();
    assert!(bytes.is_none());
}

#[tokio::test]
async fn trailing_slash_is_dropped_from_base_url() {
    let server = MockServer::start().await;
    assert_eq!(service(&server, None).base_url(), server.uri());
}
