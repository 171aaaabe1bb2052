//! Home energy-management simulator: solar, battery, household load and grid.

#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
pub mod io;
pub mod runner;
/// Environment, dispatch agent, constraint solver, ledger and simulation loop.
pub mod sim;
