//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use energy_twin::config::ScenarioConfig;
use energy_twin::devices::ConstantNoise;
use energy_twin::sim::controller::{AlwaysLog, NeverLog};
use energy_twin::sim::engine::Engine;

/// Seeded engine for the baseline scenario (seed 42).
pub fn seeded_engine() -> Engine {
    ScenarioConfig::baseline()
        .build_engine()
        .expect("baseline scenario should build")
}

/// Fully deterministic engine: mid-range noise, no routine logs.
pub fn quiet_engine(config: &ScenarioConfig) -> Engine<ConstantNoise, NeverLog> {
    config
        .build_engine_with(ConstantNoise(0.5), NeverLog)
        .expect("scenario should build")
}

/// Deterministic engine that logs every routine decision.
pub fn chatty_engine(config: &ScenarioConfig) -> Engine<ConstantNoise, AlwaysLog> {
    config
        .build_engine_with(ConstantNoise(0.5), AlwaysLog)
        .expect("scenario should build")
}
