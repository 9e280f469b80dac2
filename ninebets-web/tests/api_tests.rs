//! API behavior exercised through the router without binding a socket.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, Utc};
use ninebets_core::config::NinebetsConfig;
use ninebets_core::store::{GameStore, InMemoryStore};
use ninebets_web::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";

fn app_with(config: NinebetsConfig) -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let shared: Arc<dyn GameStore> = store.clone();
    // epoch a few seconds back so every track is mid-round
    let state = AppState::new(config, shared, Utc::now() - Duration::seconds(3)).unwrap();
    (build_router(state), store)
}

fn app() -> (Router, Arc<InMemoryStore>) {
    app_with(NinebetsConfig::deterministic_testing())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_post(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("x-admin-token", token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_timer_lists_every_track() {
    let (app, _) = app();
    let (status, body) = send(&app, get("/timer")).await;
    assert_eq!(status, StatusCode::OK);

    let timers = body["timers"].as_array().unwrap();
    let labels: Vec<&str> = timers
        .iter()
        .map(|timer| timer["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["1min", "3min", "5min", "10min"]);

    for (timer, period) in timers.iter().zip([60, 180, 300, 600]) {
        let remaining = timer["remaining"].as_u64().unwrap();
        assert!(remaining >= 1 && remaining <= period);
        assert_eq!(timer["period"].as_str().unwrap().len(), 12);
    }
}

#[tokio::test]
async fn test_timer_reset_requires_admin_token() {
    let (app, _) = app();

    let (status, _) = send(&app, admin_post("/timer?reset", json!({}), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, admin_post("/timer?reset", json!({}), Some("nope"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        send(&app, admin_post("/timer?reset", json!({}), Some(ADMIN_TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    let remaining: Vec<u64> = body["timers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|timer| timer["remaining"].as_u64().unwrap())
        .collect();
    assert_eq!(remaining, vec![60, 180, 300, 600]);
}

#[tokio::test]
async fn test_timer_post_without_reset_is_not_allowed() {
    let (app, _) = app();
    let (status, body) = send(&app, admin_post("/timer", json!({}), Some(ADMIN_TOKEN))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn test_admin_endpoints_refused_without_configured_token() {
    let (app, _) = app_with(NinebetsConfig::default());
    let (status, _) = send(
        &app,
        admin_post("/timer?reset", json!({}), Some(ADMIN_TOKEN)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_draw_validates_and_stores() {
    let (app, store) = app();

    let incomplete = json!({ "roomId": 1, "selections": { "number": "3", "color": "red" } });
    let (status, body) = send(&app, admin_post("/add-draw", incomplete, Some(ADMIN_TOKEN))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("size"));
    assert!(store.admin_draws(None).await.unwrap().is_empty());

    let complete =
        json!({ "roomId": 1, "selections": { "number": "3", "color": "green", "size": "small" } });
    let (status, body) = send(&app, admin_post("/add-draw", complete, Some(ADMIN_TOKEN))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["draw"]["number"], json!(3));
    assert_eq!(store.admin_draws(Some(1)).await.unwrap().len(), 1);
    assert!(store.admin_draws(Some(2)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_central_draw_is_memoized_per_round() {
    let (app, _) = app();

    let (status, first) = send(&app, post_json("/rounds/10min/draw", json!({ "selection": "green" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!([0, 2, 4, 6, 8].contains(&first["number"].as_u64().unwrap()));

    let (_, second) = send(&app, post_json("/rounds/10min/draw", json!({}))).await;
    assert_eq!(first, second);

    let (status, feed) = send(&app, get("/draws")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["draws"].as_array().unwrap().len(), 1);
    assert_eq!(feed["current_period"], first["period"]);
    assert!(feed["next_period"].is_string());
}

#[tokio::test]
async fn test_central_draw_unknown_track() {
    let (app, _) = app();
    let (status, _) = send(&app, post_json("/rounds/2min/draw", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post_json("/rounds/1min/draw", json!({ "selection": "blue" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_empty_draw_feed() {
    let (app, _) = app();
    let (status, feed) = send(&app, get("/draws?limit=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(feed["draws"].as_array().unwrap().is_empty());
    assert!(feed["current_period"].is_null());
}

#[tokio::test]
async fn test_history_round_trip_through_api() {
    let (app, _) = app();
    let (status, _) = send(&app, post_json("/users", json!({ "id": "alice" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, post_json("/users", json!({ "id": "alice" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let now = Utc::now().timestamp_millis();
    for (offset, result) in [(0, "Loss"), (60_000, "Win")] {
        let record = json!({
            "timestamp": now + offset,
            "selected": "red",
            "drawNumber": 6,
            "result": result,
        });
        let (status, _) = send(&app, post_json("/users/alice/history", record)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/users/alice/history")).await;
    assert_eq!(status, StatusCode::OK);
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["result"], json!("Win"));

    let (status, _) = send(&app, get("/users/ghost/history")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wallet_flow() {
    let (app, _) = app();
    send(&app, post_json("/users", json!({ "id": "bob" }))).await;

    let (status, account) =
        send(&app, post_json("/users/bob/wallet/deposit", json!({ "amount": "150" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["money"], json!(150.0));

    let (status, account) =
        send(&app, post_json("/users/bob/wallet/withdraw", json!({ "amount": 50 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["money"], json!(100.0));

    let (status, body) =
        send(&app, post_json("/users/bob/wallet/withdraw", json!({ "amount": 500 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Insufficient balance"));

    let (status, _) =
        send(&app, post_json("/users/bob/wallet/deposit", json!({ "amount": "abc" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, summary) = send(&app, get("/users/bob/wallet?filter=today")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["balance"], json!(100.0));
    let transactions = summary["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    let kinds: Vec<&str> = transactions
        .iter()
        .map(|transaction| transaction["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"Deposit") && kinds.contains(&"Withdrawal"));

    let (status, _) = send(&app, get("/users/bob/wallet?filter=yesterday")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_outage_maps_to_service_unavailable() {
    let (app, store) = app();
    store.go_offline();
    let (status, body) = send(&app, get("/draws")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}
