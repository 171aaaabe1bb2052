//! Request handlers for the API endpoints.

use std::sync::MutexGuard;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::SharedEngine;
use super::types::{ApiError, CloudCoverRequest, NewTaskRequest, StateResponse, TaskCreated};
use crate::sim::engine::Engine;
use crate::sim::types::{ChartDataPoint, TaskId};

fn lock(engine: &SharedEngine) -> Result<MutexGuard<'_, Engine>, ApiError> {
    engine
        .lock()
        .map_err(|_| ApiError::internal("simulation engine lock poisoned"))
}

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(engine): State<SharedEngine>) -> Result<Json<StateResponse>, ApiError> {
    let engine = lock(&engine)?;
    Ok(Json(StateResponse {
        tick: engine.ticks(),
        state: engine.state().clone(),
    }))
}

/// `GET /history` → 200 + chart samples, oldest first
pub async fn get_history(
    State(engine): State<SharedEngine>,
) -> Result<Json<Vec<ChartDataPoint>>, ApiError> {
    let engine = lock(&engine)?;
    Ok(Json(engine.history().cloned().collect()))
}

/// `PUT /cloud-cover` → 202, or 400 when out of range
pub async fn put_cloud_cover(
    State(engine): State<SharedEngine>,
    Json(body): Json<CloudCoverRequest>,
) -> Result<StatusCode, ApiError> {
    lock(&engine)?.set_cloud_cover(body.value)?;
    Ok(StatusCode::ACCEPTED)
}

/// `POST /blackout/toggle` → 202
pub async fn toggle_blackout(State(engine): State<SharedEngine>) -> Result<StatusCode, ApiError> {
    lock(&engine)?.toggle_blackout();
    Ok(StatusCode::ACCEPTED)
}

/// `POST /tasks` → 201 + `TaskCreated`, or 400 when the time is out of range
pub async fn create_task(
    State(engine): State<SharedEngine>,
    Json(body): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<TaskCreated>), ApiError> {
    let id = lock(&engine)?.add_task(body.time, body.action)?;
    Ok((StatusCode::CREATED, Json(TaskCreated { id })))
}

/// `DELETE /tasks/{id}` → 202, or 404 for an unknown id
pub async fn delete_task(
    State(engine): State<SharedEngine>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    lock(&engine)?.delete_task(TaskId(id))?;
    Ok(StatusCode::ACCEPTED)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::router;
    use crate::config::ScenarioConfig;

    fn make_engine() -> SharedEngine {
        let engine = ScenarioConfig::baseline().build_engine().unwrap();
        Arc::new(Mutex::new(engine))
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn state_returns_200() {
        let app = router(make_engine());
        let req = Request::builder()
            .uri("/state")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = body_json(resp).await;
        assert_eq!(json["tick"], 0);
        assert_eq!(json["state"]["grid_status"], "CONNECTED");
        assert_eq!(json["state"]["battery_soc"], 50.0);
    }

    #[tokio::test]
    async fn history_grows_with_ticks() {
        let engine = make_engine();
        engine.lock().unwrap().run(3);
        let app = router(engine);
        let req = Request::builder()
            .uri("/history")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json.as_array().map(Vec::len), Some(3));
        assert_eq!(json[0]["time"], "06:15");
    }

    #[tokio::test]
    async fn cloud_cover_out_of_range_returns_400() {
        let engine = make_engine();
        let app = router(engine.clone());
        let resp = app
            .oneshot(json_request("PUT", "/cloud-cover", r#"{"value": 1.5}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json.get("error").is_some());
        assert_eq!(engine.lock().unwrap().pending_intents(), 0);
    }

    #[tokio::test]
    async fn cloud_cover_applies_on_next_tick() {
        let engine = make_engine();
        let app = router(engine.clone());
        let resp = app
            .oneshot(json_request("PUT", "/cloud-cover", r#"{"value": 0.7}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let mut engine = engine.lock().unwrap();
        assert_eq!(engine.state().cloud_cover, 0.1);
        engine.tick();
        assert_eq!(engine.state().cloud_cover, 0.7);
    }

    #[tokio::test]
    async fn create_then_delete_task() {
        let engine = make_engine();
        let resp = router(engine.clone())
            .oneshot(json_request(
                "POST",
                "/tasks",
                r#"{"time": 18.0, "action": "FORCE_DISCHARGE"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let id = body_json(resp).await["id"].as_u64().unwrap();

        let resp = router(engine.clone())
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/tasks/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        engine.lock().unwrap().tick();
        assert!(engine.lock().unwrap().state().scheduled_tasks.is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_task_returns_404() {
        let app = router(make_engine());
        let req = Request::builder()
            .method("DELETE")
            .uri("/tasks/77")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn task_time_out_of_range_returns_400() {
        let app = router(make_engine());
        let resp = app
            .oneshot(json_request(
                "POST",
                "/tasks",
                r#"{"time": 25.0, "action": "FORCE_CHARGE"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn toggle_blackout_is_queued() {
        let engine = make_engine();
        let req = Request::builder()
            .method("POST")
            .uri("/blackout/toggle")
            .body(Body::empty())
            .unwrap();
        let resp = router(engine.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let mut engine = engine.lock().unwrap();
        assert!(!engine.state().has_blackout);
        engine.tick();
        assert!(engine.state().has_blackout);
    }
}
