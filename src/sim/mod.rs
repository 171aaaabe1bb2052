/// Day clock and tick counter.
pub mod clock;
/// Battery SoC clamping.
pub mod constraints;
pub mod controller;
pub mod engine;
/// Solar, load, price and carbon synthesis.
pub mod environment;
pub mod kpi;
pub mod ledger;
/// Scheduled override tasks.
pub mod schedule;
pub mod tariff;
pub mod types;
