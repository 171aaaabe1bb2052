//! REST API over a live simulation.
//!
//! Readers:
//! - `GET /state`: completed ticks and the current `SimulationState`
//! - `GET /history`: chart samples, oldest first
//!
//! Intents (queued, applied at the next tick):
//! - `PUT /cloud-cover`
//! - `POST /blackout/toggle`
//! - `POST /tasks`, `DELETE /tasks/{id}`

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post, put};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::sim::engine::Engine;

pub use types::{ErrorResponse, StateResponse, TaskCreated};

/// Engine shared between the ticker and request handlers.
///
/// One mutex guards both the state and the intent queue; the ticker is the
/// only writer of simulation state.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Builds the axum router with all API routes.
pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/history", get(handlers::get_history))
        .route("/cloud-cover", put(handlers::put_cloud_cover))
        .route("/blackout/toggle", post(handlers::toggle_blackout))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/{id}", delete(handlers::delete_task))
        .with_state(engine)
}

/// Spawns the fixed-cadence driver that ticks the engine every `period`.
///
/// Stops if the engine lock is poisoned.
pub fn spawn_ticker(engine: SharedEngine, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // the first tick of a tokio interval completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            match engine.lock() {
                Ok(mut engine) => {
                    engine.tick();
                }
                Err(_) => {
                    error!("simulation engine lock poisoned, stopping ticker");
                    break;
                }
            }
        }
    })
}

/// Starts the ticker, binds to `addr` and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(engine: SharedEngine, addr: SocketAddr) -> io::Result<()> {
    let period = match engine.lock() {
        Ok(engine) => Duration::from_millis(engine.config().tick_interval_ms),
        Err(_) => return Err(io::Error::other("simulation engine lock poisoned")),
    };
    let ticker = spawn_ticker(engine.clone(), period);

    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    let served = axum::serve(listener, app).await;
    ticker.abort();
    served
}
