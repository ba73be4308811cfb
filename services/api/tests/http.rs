//! HTTP endpoint tests against a running router and a mock telephony provider.

use axum::{Json, Router, http::StatusCode, routing::post};
use relay_api::{
    config::{Config, SessionLimits},
    router::create_router,
    state::AppState,
};
use relay_core::{agent::AgentConfig, client::ClientDialect, telephony::TelephonyConfig};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::net::TcpListener;

type Captured = Arc<Mutex<Vec<Value>>>;

/// Starts a fake provider that records call requests and answers with `status` and `body`.
async fn spawn_provider(status: StatusCode, body: Value) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let seen = captured.clone();
    let app = Router::new().route(
        "/v1/calls",
        post(move |Json(request): Json<Value>| {
            let seen = seen.clone();
            let body = body.clone();
            async move {
                seen.lock().unwrap().push(request);
                (status, Json(body))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/v1/calls", addr), captured)
}

fn relay_config(telephony: Option<TelephonyConfig>) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        log_level: tracing::Level::INFO,
        agent: AgentConfig {
            endpoint: "ws://127.0.0.1:1/v1/convai/conversation".to_string(),
            agent_id: "agent_test".to_string(),
            greeting: None,
        },
        dialect: ClientDialect::PlayAudio,
        limits: SessionLimits::default(),
        telephony,
    }
}

fn telephony(api_url: &str) -> TelephonyConfig {
    TelephonyConfig {
        api_url: api_url.to_string(),
        app_id: "app-1".to_string(),
        app_secret: SecretString::from("secret-1".to_string()),
        from_number: "+15550001111".to_string(),
        stream_url: "wss://relay.example.com/ws".to_string(),
    }
}

async fn spawn_relay(config: Config) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(Arc::new(AppState::new(config)));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn post_call(relay: SocketAddr, body: Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{}/make-outbound-call", relay))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_root_and_health() {
    let relay = spawn_relay(relay_config(None)).await;

    let response = reqwest::get(format!("http://{}/", relay)).await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().contains("ready"));

    let health: Value = reqwest::get(format!("http://{}/health", relay))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        health,
        json!({"status": "ok", "dialect": "play_audio", "outbound_calls": false})
    );
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let relay = spawn_relay(relay_config(None)).await;

    let doc: Value = reqwest::get(format!("http://{}/api-docs/openapi.json", relay))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(doc["paths"]["/make-outbound-call"]["post"].is_object());
}

#[tokio::test]
async fn test_outbound_call_success_returns_provider_payload() {
    let (api_url, captured) =
        spawn_provider(StatusCode::CREATED, json!({"call_id": "call-9", "status": "ringing"})).await;
    let relay = spawn_relay(relay_config(Some(telephony(&api_url)))).await;

    let (status, body) = post_call(relay, json!({"to": "+15552223333"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"call_id": "call-9", "status": "ringing"}));

    let requests = captured.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![json!({
            "app_id": "app-1",
            "app_secret": "secret-1",
            "from": "+15550001111",
            "to": "+15552223333",
            "stream_url": "wss://relay.example.com/ws",
        })]
    );
}

#[tokio::test]
async fn test_outbound_call_missing_to_is_400() {
    let (api_url, captured) = spawn_provider(StatusCode::OK, json!({})).await;
    let relay = spawn_relay(relay_config(Some(telephony(&api_url)))).await;

    let (status, body) = post_call(relay, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("'to'"));

    let (status, _) = post_call(relay, json!({"to": ""})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_outbound_call_invalid_body_is_400() {
    let relay = spawn_relay(relay_config(None)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/make-outbound-call", relay))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_outbound_call_provider_error_is_500_with_detail() {
    let (api_url, _) = spawn_provider(
        StatusCode::UNAUTHORIZED,
        json!({"error": "invalid credentials"}),
    )
    .await;
    let relay = spawn_relay(relay_config(Some(telephony(&api_url)))).await;

    let (status, body) = post_call(relay, json!({"to": "+15552223333"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], json!({"error": "invalid credentials"}));
    assert!(body["message"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_outbound_call_without_telephony_is_503() {
    let relay = spawn_relay(relay_config(None)).await;

    let (status, body) = post_call(relay, json!({"to": "+15552223333"})).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "outbound calling is not configured");
}
