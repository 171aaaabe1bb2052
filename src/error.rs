//! Error types for intents, state invariants and configuration.

use thiserror::Error;

use crate::sim::types::{GridStatus, TaskId};

/// An external intent rejected at the engine boundary.
///
/// Rejected intents never reach the simulation state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntentError {
    #[error("cloud cover must be within [0, 1], got {0}")]
    CloudCoverOutOfRange(f32),
    #[error("task time must be within [0, 24), got {0}")]
    TaskTimeOutOfRange(f32),
    #[error("no scheduled task with id {0}")]
    UnknownTask(TaskId),
}

/// A state invariant broken by a simulation step.
///
/// These indicate defects rather than recoverable conditions; the engine
/// either panics (strict mode) or rolls back to the last known-good state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("battery state of charge {0}% is outside [0, 100]")]
    SocOutOfBounds(f32),
    #[error("grid flow of {flow_kw} kW while {status}")]
    GridFlowWhileDisconnected { status: GridStatus, flow_kw: f32 },
    #[error("scheduled task id {0} appears more than once")]
    DuplicateTaskId(TaskId),
    #[error("simulated time {0} is outside [0, 24)")]
    TimeOutOfRange(f32),
    #[error("{0} is not a finite number")]
    NonFiniteValue(&'static str),
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_kwh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
