//! Environment generator: solar, load, price and carbon for each tick.

use crate::devices::{HouseholdLoad, NoiseSource, SolarArray};

use super::tariff::{CarbonModel, Tariff};

/// Environment values for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    pub solar_kw: f32,
    pub load_kw: f32,
    pub price: f32,
    pub carbon_g_per_kwh: f32,
}

/// Synthesizes the exogenous inputs the dispatch agent reacts to.
///
/// Owns the noise source so every draw goes through one stream; with a seeded
/// source, identical configurations produce identical environments.
#[derive(Debug, Clone)]
pub struct Environment<N: NoiseSource> {
    solar: SolarArray,
    load: HouseholdLoad,
    tariff: Tariff,
    carbon: CarbonModel,
    noise: N,
}

impl<N: NoiseSource> Environment<N> {
    pub fn new(
        solar: SolarArray,
        load: HouseholdLoad,
        tariff: Tariff,
        carbon: CarbonModel,
        noise: N,
    ) -> Self {
        Self {
            solar,
            load,
            tariff,
            carbon,
            noise,
        }
    }

    /// Samples the environment at `hour` under `cloud_cover`.
    ///
    /// Solar is drawn before load so the noise stream order is stable.
    pub fn sample(&mut self, hour: f32, cloud_cover: f32) -> EnvironmentReading {
        let solar_kw = self.solar.output_kw(hour, cloud_cover, &mut self.noise);
        let load_kw = self.load.demand_kw(hour, &mut self.noise);
        EnvironmentReading {
            solar_kw,
            load_kw,
            price: self.tariff.price_at(hour),
            carbon_g_per_kwh: self.carbon.intensity(solar_kw),
        }
    }
}
