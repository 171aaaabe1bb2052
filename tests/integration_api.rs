//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use energy_twin::api::{SharedEngine, router};
use energy_twin::config::ScenarioConfig;

/// Build a live engine from a named preset.
fn build_engine(preset: &str) -> SharedEngine {
    let engine = ScenarioConfig::from_preset(preset)
        .expect("preset should exist")
        .build_engine()
        .expect("preset should build");
    Arc::new(Mutex::new(engine))
}

async fn send(engine: &SharedEngine, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let resp = router(engine.clone()).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn state_reflects_preset_tasks() {
    let engine = build_engine("time_of_use");
    let (status, json) = send(&engine, get("/state")).await;
    assert_eq!(status, StatusCode::OK);

    let tasks = json["state"]["scheduled_tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert!(tasks.iter().all(|t| t["status"] == "PENDING"));
    assert_eq!(json["state"]["time"], 0.0);
}

#[tokio::test]
async fn blackout_toggle_round_trip_through_ticks() {
    let engine = build_engine("baseline");

    let (status, _) = send(&engine, post_json("/blackout/toggle", "")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    engine.lock().unwrap().run(2);

    let (_, json) = send(&engine, get("/state")).await;
    assert_eq!(json["tick"], 2);
    assert_eq!(json["state"]["grid_status"], "BLACKOUT");
    assert_eq!(json["state"]["net_grid_flow"], 0.0);

    let (status, _) = send(&engine, post_json("/blackout/toggle", "")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    engine.lock().unwrap().tick();

    let (_, json) = send(&engine, get("/state")).await;
    assert_eq!(json["state"]["has_blackout"], false);
    assert_ne!(json["state"]["grid_status"], "BLACKOUT");
}

#[tokio::test]
async fn created_task_fires_and_is_marked_executed() {
    let engine = build_engine("baseline");

    let (status, json) = send(
        &engine,
        post_json("/tasks", r#"{"time": 7.0, "action": "FORCE_CHARGE"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["id"].as_u64().unwrap();

    // 06:00 -> 07:00 is 4 ticks
    engine.lock().unwrap().run(4);

    let (_, json) = send(&engine, get("/state")).await;
    let task = &json["state"]["scheduled_tasks"][0];
    assert_eq!(task["id"].as_u64(), Some(id));
    assert_eq!(task["status"], "EXECUTED");
    assert_eq!(json["state"]["battery_flow"], 5.0);
}

#[tokio::test]
async fn history_is_capped() {
    let engine = build_engine("baseline");
    engine.lock().unwrap().run(60);

    let (status, json) = send(&engine, get("/history")).await;
    assert_eq!(status, StatusCode::OK);
    let points = json.as_array().unwrap();
    assert_eq!(points.len(), 49);
    assert_eq!(points.last().unwrap()["time"], "21:00");
}

#[tokio::test]
async fn malformed_task_body_is_rejected() {
    let engine = build_engine("baseline");
    let (status, _) = send(
        &engine,
        post_json("/tasks", r#"{"time": 7.0, "action": "EXPLODE"}"#),
    )
    .await;
    assert!(status.is_client_error());
    assert_eq!(engine.lock().unwrap().pending_intents(), 0);
}
