//! Device models for the home energy system.

/// Home battery parameters and unit conversions.
pub mod battery;
/// Household consumption model.
pub mod load;
/// Rooftop solar generation model.
pub mod solar;
pub mod types;

// Re-export the main types for convenience
pub use battery::Battery;
pub use load::{HouseholdLoad, LoadPeak};
pub use solar::SolarArray;
pub use types::{ConstantNoise, NoiseSource, SeededNoise};
