//! API request, response and error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::IntentError;
use crate::sim::types::{SimulationState, TaskAction, TaskId};

/// Current simulation state plus the number of completed ticks.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub tick: u64,
    pub state: SimulationState,
}

/// Body of `PUT /cloud-cover`.
#[derive(Debug, Deserialize)]
pub struct CloudCoverRequest {
    /// Cloud cover fraction in `[0, 1]`.
    pub value: f32,
}

/// Body of `POST /tasks`.
#[derive(Debug, Deserialize)]
pub struct NewTaskRequest {
    /// Hour of day, `[0, 24)`.
    pub time: f32,
    pub action: TaskAction,
}

/// Response of `POST /tasks`.
#[derive(Debug, Serialize)]
pub struct TaskCreated {
    pub id: TaskId,
}

/// Error response body for 4xx/5xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Handler error rendered as a status code with an [`ErrorResponse`] body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<IntentError> for ApiError {
    fn from(e: IntentError) -> Self {
        let status = match e {
            IntentError::UnknownTask(_) => StatusCode::NOT_FOUND,
            IntentError::CloudCoverOutOfRange(_) | IntentError::TaskTimeOutOfRange(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
